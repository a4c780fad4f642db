use crate::utils::error::{ConfluenceError, Result};
use std::net::SocketAddr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn config_error(field_name: &str, message: String) -> ConfluenceError {
    ConfluenceError::ConfigError {
        field: field_name.to_string(),
        message,
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(config_error(field_name, "URL cannot be empty".to_string()));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(config_error(
                field_name,
                format!("Unsupported URL scheme '{}' in '{}'", scheme, url_str),
            )),
        },
        Err(e) => Err(config_error(
            field_name,
            format!("Invalid URL format '{}': {}", url_str, e),
        )),
    }
}

pub fn validate_socket_addr(field_name: &str, addr: &str) -> Result<SocketAddr> {
    addr.parse::<SocketAddr>()
        .map_err(|e| config_error(field_name, format!("Invalid socket address '{}': {}", addr, e)))
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(config_error(field_name, "Path cannot be empty".to_string()));
    }

    if path.contains('\0') {
        return Err(config_error(field_name, "Path contains null bytes".to_string()));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(config_error(
            field_name,
            format!("Value {} must be at least {}", value, min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(config_error(
            field_name,
            "Value cannot be empty or whitespace-only".to_string(),
        ));
    }
    Ok(())
}

/// 請求欄位：序列長度下限
pub fn validate_min_len<T>(label: &str, values: &[T], min_len: usize) -> Result<()> {
    if values.len() < min_len {
        return Err(ConfluenceError::validation(format!(
            "{} must contain at least {} data points for FFT",
            label, min_len
        )));
    }
    Ok(())
}

/// 請求欄位：值必須屬於固定集合
pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(ConfluenceError::validation(format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            allowed.join(", ")
        )));
    }
    Ok(())
}
