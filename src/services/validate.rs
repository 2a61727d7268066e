use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Trimmed, non-empty text or a 400 naming the field.
pub fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Trims optional text and treats blank as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn email(value: &str) -> AppResult<String> {
    let email = required("email", value)?.to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(AppError::BadRequest("email is invalid".into()));
    }
    Ok(email)
}

pub fn password(value: &str) -> AppResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn price(value: i64) -> AppResult<i64> {
    if value < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(value)
}

pub fn stock(value: i32) -> AppResult<i32> {
    if value < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(value)
}

pub fn quantity(value: i32) -> AppResult<i32> {
    if value <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }
    Ok(value)
}

pub fn score(value: i16) -> AppResult<i16> {
    if !(1..=5).contains(&value) {
        return Err(AppError::BadRequest("score must be between 1 and 5".into()));
    }
    Ok(value)
}

/// Image references are either absolute http(s) URLs or site-relative paths.
pub fn image_url(value: &str) -> AppResult<String> {
    let url = required("url", value)?;
    let ok = url.starts_with("https://")
        || url.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"));
    if !ok || url.contains(char::is_whitespace) {
        return Err(AppError::BadRequest("url must be http(s) or a site path".into()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Kopi  ").unwrap(), "Kopi");
        assert!(required("name", "   ").is_err());
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(email(" Budi@Kampus.AC.id ").unwrap(), "budi@kampus.ac.id");
        assert!(email("budi").is_err());
        assert!(email("budi@kampus").is_err());
        assert!(email("@kampus.ac.id").is_err());
    }

    #[test]
    fn numeric_bounds() {
        assert!(price(0).is_ok());
        assert!(price(-1).is_err());
        assert!(stock(-1).is_err());
        assert!(quantity(0).is_err());
        assert!(score(0).is_err());
        assert!(score(6).is_err());
        assert_eq!(score(5).unwrap(), 5);
    }

    #[test]
    fn image_urls() {
        assert!(image_url("https://cdn.kampus.id/a.png").is_ok());
        assert!(image_url("/uploads/a.png").is_ok());
        assert!(image_url("//evil.example/a.png").is_err());
        assert!(image_url("javascript:alert(1)").is_err());
    }
}
