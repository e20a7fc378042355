// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// Validadores usados nos payloads (#[validate(custom(...))]).
// O "code" de cada erro é a chave do catálogo de mensagens.

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Telefone com pelo menos 10 dígitos, ignorando espaços, parênteses e traços.
pub fn whatsapp_number(value: &str) -> Result<(), ValidationError> {
    if digits_only(value).len() < 10 {
        return Err(ValidationError::new("whatsapp_digits"));
    }
    Ok(())
}

pub fn four_digits(value: &str) -> Result<(), ValidationError> {
    if value.len() != 4 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("last4_digits"));
    }
    Ok(())
}

pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("   ").is_err());
        assert!(not_blank("Vazamento").is_ok());
    }

    #[test]
    fn whatsapp_counts_only_digits() {
        assert!(whatsapp_number("(11) 98765-4321").is_ok());
        assert!(whatsapp_number("98765-4321").is_err());
        assert_eq!(digits_only("(11) 98765-4321"), "11987654321");
    }

    #[test]
    fn last4_must_be_exactly_four_digits() {
        assert!(four_digits("4321").is_ok());
        assert!(four_digits("432").is_err());
        assert!(four_digits("43a1").is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(non_negative(&Decimal::new(-1, 2)).is_err());
        assert!(non_negative(&Decimal::ZERO).is_ok());
        assert!(non_negative(&Decimal::new(4500, 2)).is_ok());
    }
}
