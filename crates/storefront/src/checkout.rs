//! Checkout: order totals, address validation and order placement.
//!
//! Payment is simulated. Card and UPI orders are recorded as paid, cash on
//! delivery as pending; no gateway is contacted and nothing is fulfilled.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use marigold_core::{
    CurrencyCode, Email, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ScopeKey,
    UserId,
};

use crate::cart::{Cart, LineItem};
use crate::notify::Notification;
use crate::session::ShopSession;

const MIN_POSTAL_CODE_LEN: usize = 6;
const MIN_PHONE_LEN: usize = 10;
const DEFAULT_COUNTRY: &str = "India";

/// Pricing rules applied at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub currency: CurrencyCode,
    /// Orders with a subtotal strictly above this ship free.
    pub free_shipping_threshold: Decimal,
    pub flat_shipping: Decimal,
    /// Fraction of the subtotal charged as tax (0.18 = 18% GST).
    pub tax_rate: Decimal,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::INR,
            free_shipping_threshold: Decimal::from(1000),
            flat_shipping: Decimal::from(100),
            tax_rate: Decimal::new(18, 2),
        }
    }
}

/// Totals for a cart under a [`CheckoutConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub currency: CurrencyCode,
    pub item_count: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    #[must_use]
    pub fn for_cart(cart: &Cart, config: &CheckoutConfig) -> Self {
        let subtotal = cart.subtotal();
        let shipping = if cart.is_empty() || subtotal > config.free_shipping_threshold {
            Decimal::ZERO
        } else {
            config.flat_shipping
        };
        let tax = (subtotal * config.tax_rate).round_dp(2);

        Self {
            currency: config.currency,
            item_count: cart.total_items(),
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// The total formatted for display (e.g., "₹1416.00").
    #[must_use]
    pub fn display_total(&self) -> String {
        self.currency.format(self.total)
    }
}

/// One invalid form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that prevent an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("your cart is empty")]
    EmptyCart,

    /// One or more address fields failed validation.
    #[error("invalid address: {} field(s) need attention", .0.len())]
    InvalidAddress(Vec<FieldError>),
}

/// Address form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    pub email: String,
}

/// A validated postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub email: Email,
}

impl AddressInput {
    /// Validate every field, reporting all failures under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns the list of invalid fields.
    pub fn validate(self, prefix: &str) -> Result<Address, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut required = |value: &str, field: &str, label: &str| {
            if value.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("{prefix}.{field}"),
                    format!("{label} is required"),
                ));
            }
        };
        required(&self.first_name, "first_name", "First name");
        required(&self.last_name, "last_name", "Last name");
        required(&self.address_line1, "address_line1", "Address");
        required(&self.city, "city", "City");
        required(&self.state, "state", "State");

        if self.postal_code.trim().len() < MIN_POSTAL_CODE_LEN {
            errors.push(FieldError::new(
                format!("{prefix}.postal_code"),
                "Postal code is required",
            ));
        }
        if self.phone.trim().len() < MIN_PHONE_LEN {
            errors.push(FieldError::new(
                format!("{prefix}.phone"),
                "Phone number is required",
            ));
        }
        let email = Email::parse(&self.email).map_err(|_| {
            FieldError::new(format!("{prefix}.email"), "Invalid email address")
        });

        match email {
            Ok(email) if errors.is_empty() => Ok(Address {
                first_name: self.first_name.trim().to_owned(),
                last_name: self.last_name.trim().to_owned(),
                address_line1: self.address_line1.trim().to_owned(),
                address_line2: self
                    .address_line2
                    .map(|line| line.trim().to_owned())
                    .filter(|line| !line.is_empty()),
                city: self.city.trim().to_owned(),
                state: self.state.trim().to_owned(),
                postal_code: self.postal_code.trim().to_owned(),
                country: DEFAULT_COUNTRY.to_owned(),
                phone: self.phone.trim().to_owned(),
                email,
            }),
            Ok(_) => Err(errors),
            Err(e) => {
                errors.push(e);
                Err(errors)
            }
        }
    }
}

/// Checkout form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub shipping: AddressInput,
    #[serde(default)]
    pub billing: Option<AddressInput>,
    #[serde(default = "default_same_as_shipping")]
    pub same_as_shipping: bool,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub save_address: bool,
}

const fn default_same_as_shipping() -> bool {
    true
}

impl CheckoutRequest {
    /// Validate both addresses, returning (shipping, billing).
    fn addresses(self) -> Result<(Address, Address), CheckoutError> {
        let shipping = self.shipping.validate("shipping");
        let billing = if self.same_as_shipping {
            None
        } else {
            Some(self.billing.map_or_else(
                || {
                    Err(vec![FieldError::new(
                        "billing",
                        "Billing address is required",
                    )])
                },
                |billing| billing.validate("billing"),
            ))
        };

        match (shipping, billing) {
            (Ok(shipping), None) => Ok((shipping.clone(), shipping)),
            (Ok(shipping), Some(Ok(billing))) => Ok((shipping, billing)),
            (shipping, billing) => {
                let mut errors = shipping.err().unwrap_or_default();
                if let Some(Err(billing_errors)) = billing {
                    errors.extend(billing_errors);
                }
                Err(CheckoutError::InvalidAddress(errors))
            }
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub lines: Vec<LineItem>,
    pub summary: OrderSummary,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Short human-facing reference, e.g. "#1A2B3C4D".
    #[must_use]
    pub fn reference(&self) -> String {
        let id = self.id.to_string();
        let head = id.split('-').next().unwrap_or(&id);
        format!("#{}", head.to_uppercase())
    }
}

/// Whether a saved address was entered for shipping or billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Shipping,
    Billing,
}

/// An address remembered for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub kind: AddressKind,
    pub address: Address,
    pub saved_at: DateTime<Utc>,
}

/// Place an order for everything in the session's cart.
///
/// On success the order is appended to the signed-in user's history, the
/// addresses are saved when requested, and the cart is cleared.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no lines, or
/// `CheckoutError::InvalidAddress` with every invalid field.
pub fn place_order(
    session: &mut ShopSession,
    request: CheckoutRequest,
    config: &CheckoutConfig,
) -> Result<Order, CheckoutError> {
    let cart = session.cart().cart();
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let payment_method = request.payment_method;
    let save_address = request.save_address;
    let (shipping_address, billing_address) = request.addresses()?;

    let created_at = Utc::now();
    let user_id = session.identity().user_id();
    let order = Order {
        id: OrderId::generate(),
        user_id,
        status: OrderStatus::Pending,
        payment_status: payment_method.initial_status(),
        payment_method,
        transaction_id: format!("TXN{}", created_at.timestamp_millis()),
        lines: cart.items().to_vec(),
        summary: OrderSummary::for_cart(cart, config),
        shipping_address,
        billing_address,
        created_at,
    };

    if let Some(user) = user_id {
        record_order(session, user, &order, save_address);
    }

    info!(
        order_id = %order.id,
        identity = %session.identity(),
        total = %order.summary.total,
        payment_method = %order.payment_method,
        "Order placed"
    );

    session.cart_mut().clear_cart();
    session
        .notifier()
        .notify(Notification::success("Order placed successfully!"));

    Ok(order)
}

fn record_order(session: &ShopSession, user: UserId, order: &Order, save_address: bool) {
    let store = session.store();

    let history_key = ScopeKey::Orders(user);
    let mut history: Vec<Order> = store.load(&history_key);
    history.push(order.clone());
    store.save(&history_key, &history);

    if !save_address {
        return;
    }
    let addresses_key = ScopeKey::Addresses(user);
    let mut saved: Vec<SavedAddress> = store.load(&addresses_key);
    saved.push(SavedAddress {
        kind: AddressKind::Shipping,
        address: order.shipping_address.clone(),
        saved_at: order.created_at,
    });
    if order.billing_address != order.shipping_address {
        saved.push(SavedAddress {
            kind: AddressKind::Billing,
            address: order.billing_address.clone(),
            saved_at: order.created_at,
        });
    }
    store.save(&addresses_key, &saved);
}
