use std::fmt::Write;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Customer, Person};
use crate::state::SharedState;

pub async fn customers(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = db::customers::list_all(&state.pool).await?;
    Ok(csv_response("customers.csv", customers_csv(&rows)))
}

pub async fn people(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = db::people::list_all(&state.pool).await?;
    Ok(csv_response("people.csv", people_csv(&rows)))
}

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

fn customers_csv(rows: &[Customer]) -> String {
    let mut csv = String::from(
        "id,name,customer_type,tax_number,contact,phone,email,address,credit_rating,created_at\n",
    );
    for c in rows {
        let fields = [
            c.id.to_string(),
            c.name.clone(),
            c.customer_type.clone().unwrap_or_default(),
            c.tax_number.clone().unwrap_or_default(),
            c.contact.clone().unwrap_or_default(),
            c.phone.clone().unwrap_or_default(),
            c.email.clone().unwrap_or_default(),
            c.address.clone().unwrap_or_default(),
            c.credit_rating.clone().unwrap_or_default(),
            c.created_at.to_rfc3339(),
        ];
        push_row(&mut csv, &fields);
    }
    csv
}

fn people_csv(rows: &[Person]) -> String {
    let mut csv = String::from("id,name,phone,id_card,is_service_person,created_at\n");
    for p in rows {
        let fields = [
            p.id.to_string(),
            p.name.clone(),
            p.phone.clone(),
            p.id_card.clone().unwrap_or_default(),
            p.is_service_person.to_string(),
            p.created_at.to_rfc3339(),
        ];
        push_row(&mut csv, &fields);
    }
    csv
}

fn push_row(csv: &mut String, fields: &[String]) {
    let line = fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(csv, "{line}");
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
