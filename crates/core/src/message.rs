//! WhatsApp order message and deep link.
//!
//! Checkout never talks to WhatsApp directly: the storefront hands the
//! customer a `https://wa.me/` link with the order pre-filled and the
//! customer's own app does the sending.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::OrderSession;
use crate::types::{CurrencyCode, Price};

const WHATSAPP_BASE_URL: &str = "https://wa.me/";
const SEPARATOR: &str = "-----------------------------------";

/// How the customer gets the order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fulfillment {
    #[default]
    Pickup,
    Delivery { address: String },
}

/// Who is ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub fulfillment: Fulfillment,
}

/// Shop-level settings for the composed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSettings {
    pub shop_name: String,
    pub currency: CurrencyCode,
    /// Flat surcharge added to the total for delivery orders.
    pub delivery_fee: Price,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            shop_name: "Gante Gelato & Chocolates".to_string(),
            currency: CurrencyCode::default(),
            delivery_fee: Price::ZERO,
        }
    }
}

/// Why an order message could not be composed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("Seu pedido esta vazio.")]
    EmptyOrder,

    #[error("Informe seu nome.")]
    MissingName,

    #[error("Informe o endereco de entrega.")]
    MissingAddress,

    #[error("invalid WhatsApp number: {0}")]
    InvalidPhone(String),
}

/// A composed checkout, ready to hand to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkout {
    pub message: String,
    pub url: String,
    pub total: Price,
}

/// Order total including the delivery surcharge when it applies.
#[must_use]
pub fn order_total(session: &OrderSession, customer: &Customer, settings: &MessageSettings) -> Price {
    match customer.fulfillment {
        Fulfillment::Pickup => session.total(),
        Fulfillment::Delivery { .. } => session.total() + settings.delivery_fee,
    }
}

/// Compose the order message.
///
/// Lists every committed line item in commit order with its price, then the
/// fulfillment details and the total.
///
/// # Errors
///
/// Returns `MessageError` for an empty order, a blank customer name, or a
/// delivery without an address.
pub fn build_order_message(
    session: &OrderSession,
    customer: &Customer,
    settings: &MessageSettings,
) -> Result<String, MessageError> {
    if session.is_empty() {
        return Err(MessageError::EmptyOrder);
    }
    let name = customer.name.trim();
    if name.is_empty() {
        return Err(MessageError::MissingName);
    }
    if let Fulfillment::Delivery { address } = &customer.fulfillment
        && address.trim().is_empty()
    {
        return Err(MessageError::MissingAddress);
    }

    let currency = settings.currency;
    let mut message = String::new();
    // Writing to a String cannot fail.
    let _ = write!(
        message,
        "*Pedido {}*\n\n*Cliente:* {name}\n{SEPARATOR}\n\n",
        settings.shop_name
    );
    for (index, item) in session.items().iter().enumerate() {
        let _ = write!(
            message,
            "*{}.* {}\n   Valor: {}\n\n",
            index + 1,
            item.description,
            item.price.display(currency)
        );
    }
    message.push_str(SEPARATOR);
    message.push('\n');

    match &customer.fulfillment {
        Fulfillment::Pickup => message.push_str("*Retirada na loja*\n"),
        Fulfillment::Delivery { address } => {
            let _ = writeln!(message, "*Entrega:* {}", address.trim());
            if settings.delivery_fee > Price::ZERO {
                let _ = writeln!(
                    message,
                    "Taxa de entrega: {}",
                    settings.delivery_fee.display(currency)
                );
            }
        }
    }

    let total = order_total(session, customer, settings);
    let _ = write!(
        message,
        "*TOTAL: {}*\n\nObrigado pela preferencia!",
        total.display(currency)
    );
    Ok(message)
}

/// Strip formatting from a phone number, leaving digits only.
///
/// # Errors
///
/// Returns `MessageError::InvalidPhone` when nothing usable remains or the
/// input holds characters other than digits, spaces, `+`, `-` or parentheses.
pub fn normalize_phone(phone: &str) -> Result<String, MessageError> {
    let mut digits = String::with_capacity(phone.len());
    for c in phone.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '+' | '-' | '(' | ')' => {}
            _ => return Err(MessageError::InvalidPhone(phone.to_string())),
        }
    }
    if digits.is_empty() {
        return Err(MessageError::InvalidPhone(phone.to_string()));
    }
    Ok(digits)
}

/// Build the `wa.me` link that opens a chat with `message` pre-filled.
///
/// # Errors
///
/// Returns `MessageError::InvalidPhone` for an unusable phone number.
pub fn deep_link(phone: &str, message: &str) -> Result<String, MessageError> {
    let digits = normalize_phone(phone)?;
    Ok(format!(
        "{WHATSAPP_BASE_URL}{digits}?text={}",
        urlencoding::encode(message)
    ))
}

/// Compose the message and its link in one go.
///
/// # Errors
///
/// See [`build_order_message`] and [`deep_link`].
pub fn checkout(
    session: &OrderSession,
    customer: &Customer,
    settings: &MessageSettings,
    phone: &str,
) -> Result<Checkout, MessageError> {
    let message = build_order_message(session, customer, settings)?;
    let url = deep_link(phone, &message)?;
    Ok(Checkout {
        total: order_total(session, customer, settings),
        message,
        url,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::order::CatalogSnapshot;
    use crate::types::{Product, ProductId, ProductType};

    fn session_with_two_items() -> OrderSession {
        let snapshot = CatalogSnapshot::new(
            [
                Product {
                    id: ProductId::new("d1"),
                    name: "Casquinha Simples".to_string(),
                    description: String::new(),
                    price: Price::from_cents(300),
                    category: None,
                    kind: ProductType::Misc,
                    image_url: String::new(),
                },
                Product {
                    id: ProductId::new("d3"),
                    name: "Agua Mineral".to_string(),
                    description: String::new(),
                    price: Price::from_cents(400),
                    category: None,
                    kind: ProductType::Misc,
                    image_url: String::new(),
                },
            ],
            [],
        );
        let mut session = OrderSession::default();
        session.add_misc(ProductId::new("d1"));
        session.commit_misc(&snapshot).unwrap();
        session.add_misc(ProductId::new("d3"));
        session.add_misc(ProductId::new("d3"));
        session.commit_misc(&snapshot).unwrap();
        session
    }

    fn pickup(name: &str) -> Customer {
        Customer {
            name: name.to_string(),
            fulfillment: Fulfillment::Pickup,
        }
    }

    #[test]
    fn test_message_layout() {
        let message = build_order_message(
            &session_with_two_items(),
            &pickup("  Ana "),
            &MessageSettings::default(),
        )
        .unwrap();

        let expected = "*Pedido Gante Gelato & Chocolates*\n\n\
            *Cliente:* Ana\n\
            -----------------------------------\n\n\
            *1.* Diversos - Casquinha Simples\n   Valor: R$ 3,00\n\n\
            *2.* Diversos - Agua Mineral (x2)\n   Valor: R$ 8,00\n\n\
            -----------------------------------\n\
            *Retirada na loja*\n\
            *TOTAL: R$ 11,00*\n\n\
            Obrigado pela preferencia!";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_each_description_appears_once_in_order() {
        let session = session_with_two_items();
        let message =
            build_order_message(&session, &pickup("Ana"), &MessageSettings::default()).unwrap();
        let mut cursor = 0;
        for item in session.items() {
            assert_eq!(message.matches(item.description.as_str()).count(), 1);
            let at = message.find(item.description.as_str()).unwrap();
            assert!(at > cursor);
            cursor = at;
        }
    }

    #[test]
    fn test_delivery_adds_fee_to_total() {
        let settings = MessageSettings {
            delivery_fee: Price::from_cents(700),
            ..MessageSettings::default()
        };
        let customer = Customer {
            name: "Ana".to_string(),
            fulfillment: Fulfillment::Delivery {
                address: "Rua das Flores, 12".to_string(),
            },
        };
        let session = session_with_two_items();
        let message = build_order_message(&session, &customer, &settings).unwrap();

        assert!(message.contains("*Entrega:* Rua das Flores, 12\n"));
        assert!(message.contains("Taxa de entrega: R$ 7,00\n"));
        assert!(message.contains("*TOTAL: R$ 18,00*"));
        assert_eq!(
            order_total(&session, &customer, &settings),
            Price::from_cents(1800)
        );
        assert_eq!(
            order_total(&session, &pickup("Ana"), &settings),
            Price::from_cents(1100)
        );
    }

    #[test]
    fn test_rejects_incomplete_checkout() {
        let settings = MessageSettings::default();
        assert_eq!(
            build_order_message(&OrderSession::default(), &pickup("Ana"), &settings),
            Err(MessageError::EmptyOrder)
        );
        let session = session_with_two_items();
        assert_eq!(
            build_order_message(&session, &pickup("   "), &settings),
            Err(MessageError::MissingName)
        );
        let customer = Customer {
            name: "Ana".to_string(),
            fulfillment: Fulfillment::Delivery {
                address: " ".to_string(),
            },
        };
        assert_eq!(
            build_order_message(&session, &customer, &settings),
            Err(MessageError::MissingAddress)
        );
    }

    #[test]
    fn test_deep_link_encodes_message() {
        let url = deep_link("+55 (11) 99999-9999", "*Oi*\nR$ 3,00").unwrap();
        assert_eq!(
            url,
            "https://wa.me/5511999999999?text=%2AOi%2A%0AR%24%203%2C00"
        );
        assert!(deep_link("call me", "x").is_err());
        assert!(deep_link("", "x").is_err());
    }

    #[test]
    fn test_checkout_bundles_message_link_and_total() {
        let session = session_with_two_items();
        let checkout = checkout(
            &session,
            &pickup("Ana"),
            &MessageSettings::default(),
            "5511999999999",
        )
        .unwrap();
        assert_eq!(checkout.total, Price::from_cents(1100));
        assert!(checkout.url.starts_with("https://wa.me/5511999999999?text="));
        assert!(checkout.message.ends_with("Obrigado pela preferencia!"));
    }
}
