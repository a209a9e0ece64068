use chrono::NaiveDate;
use sqlx::PgPool;

use crate::console::input::{is_confirmation, parse_selection, ConsoleInput, Selection};
use crate::error::Result;
use crate::models::operator::Operator;
use crate::services::{
    meter_registry::{self, RegisterMeterRequest},
    request_resolution,
};

pub async fn menu(pool: &PgPool, input: &mut ConsoleInput, operator: &Operator) -> Result<()> {
    loop {
        println!();
        println!("--- OPERATOR MENU ({}) ---", operator.department);
        println!("1. Register a new meter");
        println!("2. Manage pending service-change requests");
        println!("0. Log out");

        let choice = input.prompt("Select an option: ").await?;
        let outcome = match choice.as_str() {
            "1" => register_meter(pool, input).await,
            "2" => manage_requests(pool, input, operator).await,
            "0" => {
                println!("Logged out.");
                return Ok(());
            }
            _ => {
                println!("Invalid option.");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            tracing::warn!(error = %e, "operator menu action failed");
            println!("Error: {e}");
        }
    }
}

async fn register_meter(pool: &PgPool, input: &mut ConsoleInput) -> Result<()> {
    println!();
    println!("--- REGISTER NEW METER ---");

    let meter_type = input.prompt("Type (e.g. iM10): ").await?;
    let brand = input.prompt("Brand (e.g. ABB): ").await?;
    let location = input.prompt("Location: ").await?;

    let year_text = input.prompt("Manufacture year (YYYY): ").await?;
    let Ok(manufacture_year) = year_text.parse::<i32>() else {
        println!("The manufacture year must be numeric.");
        return Ok(());
    };

    let date_text = input.prompt("Installation date (YYYY-MM-DD): ").await?;
    let Ok(installed_on) = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d") else {
        println!("The installation date must be in YYYY-MM-DD format.");
        return Ok(());
    };

    let nis_text = input.prompt("NIS of the customer to associate: ").await?;
    let Ok(customer_nis) = nis_text.parse::<i32>() else {
        println!("The NIS must be numeric.");
        return Ok(());
    };

    let request = RegisterMeterRequest {
        meter_type,
        brand,
        location,
        installed_on,
        manufacture_year,
        customer_nis,
    };

    match meter_registry::register_meter(pool, request).await {
        Ok(meter) => println!(
            "Meter #{} registered for NIS {} in state {}.",
            meter.id, customer_nis, meter.state_name
        ),
        Err(e) => println!("Registration rejected: {e}"),
    }

    Ok(())
}

async fn manage_requests(pool: &PgPool, input: &mut ConsoleInput, operator: &Operator) -> Result<()> {
    println!();
    println!("--- MANAGE SERVICE-CHANGE REQUESTS ---");

    let mut requests = request_resolution::pending_requests(pool).await?;
    if requests.is_empty() {
        println!("There are currently no pending requests to manage.");
        return Ok(());
    }

    let filter = input
        .prompt("NIS to filter pending requests (empty for all): ")
        .await?;
    if !filter.is_empty() {
        match request_resolution::pending_requests_for_nis(pool, &filter).await {
            Ok(filtered) if filtered.is_empty() => {
                println!("No pending requests for NIS {filter}.");
                return Ok(());
            }
            Ok(filtered) => requests = filtered,
            Err(e) => {
                println!("Filter failed: {e}");
                return Ok(());
            }
        }
    }

    println!();
    println!("--- PENDING REQUESTS ---");
    for (i, request) in requests.iter().enumerate() {
        println!(
            "{}. #{}  NIS {}  {}  \"{}\"",
            i + 1,
            request.id,
            request.customer_nis,
            request.request_type_name,
            request.justification
        );
    }

    let entry = input
        .prompt("\nRequest number to process (0 to cancel): ")
        .await?;
    let request = match parse_selection(&entry, requests.len()) {
        Selection::Cancel => {
            println!("Operation cancelled.");
            return Ok(());
        }
        Selection::Index(i) => &requests[i],
        Selection::OutOfRange => {
            println!("That request number does not exist.");
            return Ok(());
        }
        Selection::NotANumber => {
            println!("You must enter a number.");
            return Ok(());
        }
    };

    let Some(meter) = request_resolution::meter_for_request(pool, request).await? else {
        println!("The selected request has no associated meter.");
        return Ok(());
    };

    println!();
    println!("--- ASSOCIATED METER ---");
    println!(
        "Meter #{}  brand {}  current state: {}",
        meter.id, meter.brand, meter.state_name
    );

    // The target state follows from the request's change type.
    let Some(request_type) = request.request_type() else {
        println!(
            "Request type '{}' is not recognized; no state change applied.",
            request.request_type_name
        );
        return Ok(());
    };
    let target = request_type.target_state();

    println!("Changing meter from '{}' to '{}'.", meter.state_name, target);
    let confirm = input.prompt("Confirm the action (y/N): ").await?;
    if !is_confirmation(&confirm) {
        println!("Change cancelled by the operator.");
        return Ok(());
    }

    match request_resolution::resolve_request(pool, request, target.as_str(), operator).await {
        Ok(resolved) => println!(
            "Request #{} is now {}. Meter #{} set to {}.",
            resolved.id, resolved.request_state_name, meter.id, target
        ),
        Err(e) => println!("Resolution failed: {e}"),
    }

    Ok(())
}
