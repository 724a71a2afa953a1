use diesel::pg::PgConnection;
use diesel::prelude::*;
use dotenv::dotenv;
use std::env;

pub fn establish_connection() -> Result<PgConnection, ConnectionError> {
    // Try to load .env again to ensure environment variables are available
    dotenv().ok();

    match env::var("DATABASE_URL") {
        Ok(database_url) => match PgConnection::establish(&database_url) {
            Ok(conn) => Ok(conn),
            Err(e) => {
                log::error!("Failed to establish database connection: {}", e);
                Err(e)
            }
        },
        Err(e) => {
            log::error!("DATABASE_URL environment variable not found: {}", e);
            Err(ConnectionError::BadConnection(
                "DATABASE_URL environment variable not set".to_string(),
            ))
        }
    }
}
