use sqlx::PgPool;

use crate::models::{
    customer::Customer,
    invoice::{Invoice, STATUS_PAID},
    payment::Payment,
};

#[derive(thiserror::Error, Debug)]
pub enum PaymentError {
    #[error("No invoice found with id {0}")]
    InvoiceNotFound(i32),

    #[error("Invoice #{0} does not belong to this customer")]
    NotInvoiceOwner(i32),

    #[error("Invoice #{0} is not pending payment")]
    InvoiceNotPending(i32),

    #[error("Payment of {offered:.2} does not cover the invoice amount {due:.2}")]
    InsufficientAmount { offered: f64, due: f64 },

    #[error("Payment method must not be empty")]
    EmptyMethod,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A positive payment that covers the full invoice amount.
pub fn amount_covers_invoice(offered: f64, due: f64) -> bool {
    offered > 0.0 && offered >= due
}

pub async fn invoices_for_customer(
    pool: &PgPool,
    customer: &Customer,
) -> Result<Vec<Invoice>, PaymentError> {
    Ok(Invoice::list_for_customer(pool, customer.id).await?)
}

/// Records a payment against one of the customer's Pending invoices and marks
/// the invoice Paid. Both writes happen in one transaction.
#[tracing::instrument(skip(pool, customer), fields(customer_nis = customer.nis))]
pub async fn pay_invoice(
    pool: &PgPool,
    customer: &Customer,
    invoice_id: i32,
    amount: f64,
    method: &str,
) -> Result<Payment, PaymentError> {
    if method.trim().is_empty() {
        return Err(PaymentError::EmptyMethod);
    }

    let invoice = Invoice::find_by_id(pool, invoice_id)
        .await?
        .ok_or(PaymentError::InvoiceNotFound(invoice_id))?;

    if invoice.customer_id != customer.id {
        return Err(PaymentError::NotInvoiceOwner(invoice_id));
    }

    if !invoice.is_pending() {
        return Err(PaymentError::InvoiceNotPending(invoice_id));
    }

    if !amount_covers_invoice(amount, invoice.amount) {
        return Err(PaymentError::InsufficientAmount {
            offered: amount,
            due: invoice.amount,
        });
    }

    let mut tx = pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (amount, method, invoice_id)
        VALUES ($1, $2, $3)
        RETURNING id, amount, paid_at, method, status, invoice_id
        "#,
    )
    .bind(amount)
    .bind(method.trim())
    .bind(invoice.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE invoices SET status = $1 WHERE id = $2
        "#,
    )
    .bind(STATUS_PAID)
    .bind(invoice.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(invoice_id = invoice.id, payment_id = payment.id, "invoice paid");

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_must_cover_full_amount() {
        assert!(amount_covers_invoice(84.20, 84.20));
        assert!(amount_covers_invoice(100.0, 84.20));
        assert!(!amount_covers_invoice(50.0, 84.20));
    }

    #[test]
    fn test_payment_must_be_positive() {
        assert!(!amount_covers_invoice(0.0, 0.0));
        assert!(!amount_covers_invoice(-5.0, -10.0));
    }
}
