pub mod api;
pub mod auth;

use crate::Commands;
use anyhow::Result;
use planner_application::AppContext;
use serde::Serialize;

pub async fn run(context: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => auth::login(context, email, password).await,
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => auth::register(context, name, email, password, confirm_password).await,
        Commands::Logout => auth::logout(context),
        Commands::Whoami { verify } => auth::whoami(context, verify).await,
        Commands::Get { path, query } => api::get(context, &path, query).await,
        Commands::Post { path, data } => api::post(context, &path, data.as_deref()).await,
        Commands::Put { path, data } => api::put(context, &path, data.as_deref()).await,
        Commands::Patch { path, data } => api::patch(context, &path, data.as_deref()).await,
        Commands::Delete { path } => api::delete(context, &path).await,
        Commands::Upload { path, file, fields } => api::upload(context, &path, &file, fields).await,
        Commands::Courses => api::courses(context).await,
        Commands::Assignments => api::assignments(context).await,
        Commands::Schedule => api::schedule(context).await,
        Commands::Sessions => api::sessions(context).await,
        Commands::Gpa => api::gpa(context).await,
    }
}

/// Parses `key=value`. The value may itself contain `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("semester=WS24").unwrap(),
            ("semester".to_string(), "WS24".to_string())
        );
        assert_eq!(
            parse_key_value("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
