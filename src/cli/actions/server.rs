use crate::api;
use crate::cli::actions::Action;
use anyhow::{anyhow, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_secret,
        } => {
            let dsn = Url::parse(&dsn)?;

            if dsn.scheme() != "postgres" && dsn.scheme() != "postgresql" {
                return Err(anyhow!("unsupported database scheme: {}", dsn.scheme()));
            }

            api::new(port, dsn.to_string(), token_secret).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[tokio::test]
    async fn rejects_non_postgres_dsn() {
        let action = Action::Server {
            port: 8080,
            dsn: "mysql://localhost/sigilo".to_string(),
            token_secret: SecretString::from("sekreta".to_string()),
        };
        let result = handle(action).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_invalid_dsn() {
        let action = Action::Server {
            port: 8080,
            dsn: "not a url".to_string(),
            token_secret: SecretString::from("sekreta".to_string()),
        };
        let result = handle(action).await;
        assert!(result.is_err());
    }
}
