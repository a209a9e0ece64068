mod client;
mod input;
mod operator;

use sqlx::PgPool;

use crate::error::Result;
use crate::services::auth::{self, AuthenticatedUser};
use input::ConsoleInput;

/// The interactive console session. Owns stdin and the database pool; every
/// use case runs to completion or reports its failure inline, and the loop
/// keeps going.
pub struct Console {
    pool: PgPool,
    input: ConsoleInput,
}

impl Console {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            input: ConsoleInput::new(),
        }
    }

    /// Top-level loop: login or quit. A finished session drops back here.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            println!();
            println!("=============================================");
            println!("      ELECTRIC UTILITY SERVICE DESK");
            println!("=============================================");
            println!("1. Log in");
            println!("0. Quit");

            let choice = self.input.prompt("Select an option: ").await?;
            match choice.as_str() {
                "1" => {
                    if let Some(user) = self.login().await? {
                        if let Err(e) = self.session(user).await {
                            tracing::error!(error = %e, "session ended with error");
                            println!("Error: {e}");
                        }
                    }
                }
                "0" => {
                    println!("Shutting down.");
                    return Ok(());
                }
                _ => println!("Invalid option, try again."),
            }
        }
    }

    async fn login(&mut self) -> Result<Option<AuthenticatedUser>> {
        println!();
        println!("--- LOG IN ---");
        let identifier = self.input.prompt("Email / NIS / operator id: ").await?;
        let password = self.input.prompt_secret("Password: ").await?;

        match auth::authenticate(&self.pool, &identifier, &password).await {
            Ok(user) => {
                println!("Welcome, {}.", user.display_name());
                Ok(Some(user))
            }
            Err(e) => {
                println!("Login failed: {e}");
                Ok(None)
            }
        }
    }

    /// Role-specific menu loop until the user logs out.
    async fn session(&mut self, user: AuthenticatedUser) -> Result<()> {
        match user {
            AuthenticatedUser::Customer(customer) => {
                client::menu(&self.pool, &mut self.input, &customer).await
            }
            AuthenticatedUser::Operator(operator) => {
                operator::menu(&self.pool, &mut self.input, &operator).await
            }
        }
    }
}
