use sqlx::PgPool;

use crate::console::input::ConsoleInput;
use crate::error::Result;
use crate::models::{customer::Customer, meter::Meter};
use crate::services::{billing, request_intake};

pub async fn menu(pool: &PgPool, input: &mut ConsoleInput, customer: &Customer) -> Result<()> {
    loop {
        println!();
        println!("--- CUSTOMER MENU (NIS {}) ---", customer.nis);
        println!("1. Request a service state change");
        println!("2. View my invoices");
        println!("3. Pay an invoice");
        println!("0. Log out");

        let choice = input.prompt("Select an option: ").await?;
        let outcome = match choice.as_str() {
            "1" => request_change(pool, input, customer).await,
            "2" => show_invoices(pool, customer).await,
            "3" => pay_invoice(pool, input, customer).await,
            "0" => {
                println!("Logged out.");
                return Ok(());
            }
            _ => {
                println!("Invalid option.");
                Ok(())
            }
        };

        // Use-case failures are reported and the menu continues.
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "customer menu action failed");
            println!("Error: {e}");
        }
    }
}

async fn request_change(pool: &PgPool, input: &mut ConsoleInput, customer: &Customer) -> Result<()> {
    println!();
    println!("--- REQUEST SERVICE STATE CHANGE ---");

    let Some(meter) = Meter::find_by_customer(pool, customer.id).await? else {
        println!("You cannot request a change: no meter is associated with your account.");
        return Ok(());
    };

    println!("Current state of your service: {}", meter.state_name);
    let reported = input
        .prompt(&format!("Confirm the current state ({}): ", meter.state_name))
        .await?;
    let request_type = input
        .prompt("Request type (Activation, Suspension, Decommission): ")
        .await?;
    let justification = input.prompt("Comment (at least 10 characters): ").await?;

    match request_intake::submit_request(pool, customer, &reported, &request_type, &justification)
        .await
    {
        Ok(request) => {
            println!(
                "Request #{} registered. Type: {}. Status: {}.",
                request.id, request.request_type_name, request.request_state_name
            );
        }
        Err(e) => println!("Request rejected: {e}"),
    }

    Ok(())
}

async fn show_invoices(pool: &PgPool, customer: &Customer) -> Result<()> {
    let invoices = billing::invoices_for_customer(pool, customer).await?;
    if invoices.is_empty() {
        println!("You have no invoices.");
        return Ok(());
    }

    println!();
    println!("--- YOUR INVOICES ---");
    for invoice in &invoices {
        println!(
            "#{}  {:.2}  issued {}  due {}  {:.1} kWh  [{}]",
            invoice.id,
            invoice.amount,
            invoice.issued_on,
            invoice.due_on,
            invoice.consumption_kwh,
            invoice.status
        );
    }

    Ok(())
}

async fn pay_invoice(pool: &PgPool, input: &mut ConsoleInput, customer: &Customer) -> Result<()> {
    show_invoices(pool, customer).await?;

    let id_text = input.prompt("Invoice number to pay (0 to cancel): ").await?;
    let Ok(invoice_id) = id_text.parse::<i32>() else {
        println!("The invoice number must be numeric.");
        return Ok(());
    };
    if invoice_id == 0 {
        println!("Payment cancelled.");
        return Ok(());
    }

    let amount_text = input.prompt("Amount: ").await?;
    let Ok(amount) = amount_text.parse::<f64>() else {
        println!("The amount must be numeric.");
        return Ok(());
    };

    let method = input.prompt("Payment method (e.g. Cash, Card): ").await?;

    match billing::pay_invoice(pool, customer, invoice_id, amount, &method).await {
        Ok(payment) => println!(
            "Payment #{} of {:.2} recorded. Invoice #{} is now paid.",
            payment.id, payment.amount, payment.invoice_id
        ),
        Err(e) => println!("Payment rejected: {e}"),
    }

    Ok(())
}
