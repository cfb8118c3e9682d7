//! Construction of order-entry requests.
//!
//! Pure functions from primitive parameters to outbound messages. Nothing
//! here touches a session; sending is the queue's job.

use fixprobe_core::{
    tags, ClOrdId, Message, MsgType, OrdType, Price, Quantity, Result, Side, TimeInForce,
};
use serde::{Deserialize, Serialize};

/// Parameters of a new order. Price and quantity stay strings until the
/// message is built so malformed values surface as `InvalidNumericField`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    /// Instrument symbol. Default: "BAT-AUD".
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Limit price. Ignored for market orders. Default: "5".
    #[serde(default = "default_price")]
    pub price: String,
    /// Order quantity. Default: "0.1".
    #[serde(default = "default_quantity")]
    pub quantity: String,
    #[serde(default = "default_side")]
    pub side: Side,
    #[serde(default = "default_order_type")]
    pub order_type: OrdType,
    #[serde(default)]
    pub time_in_force: TimeInForce,
}

fn default_symbol() -> String {
    "BAT-AUD".to_string()
}

fn default_price() -> String {
    "5".to_string()
}

fn default_quantity() -> String {
    "0.1".to_string()
}

fn default_side() -> Side {
    Side::Buy
}

fn default_order_type() -> OrdType {
    OrdType::Limit
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            price: default_price(),
            quantity: default_quantity(),
            side: default_side(),
            order_type: default_order_type(),
            time_in_force: TimeInForce::default(),
        }
    }
}

impl OrderParams {
    /// Same order with a different quantity.
    pub fn with_quantity(&self, quantity: impl Into<String>) -> Self {
        Self {
            quantity: quantity.into(),
            ..self.clone()
        }
    }
}

/// Builds NewOrderSingle, OrderCancelRequest and OrderStatusRequest messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBuilder;

impl OrderBuilder {
    /// Build a NewOrderSingle.
    ///
    /// Price (44) is written only for limit orders.
    ///
    /// # Errors
    /// `CoreError::InvalidNumericField` if the quantity, or the price of a
    /// limit order, is not a representable decimal.
    pub fn new_order(&self, params: &OrderParams, cl_ord_id: &ClOrdId) -> Result<Message> {
        let quantity = Quantity::parse(&params.quantity)?;
        let price = if params.order_type.requires_price() {
            Some(Price::parse(&params.price)?)
        } else {
            None
        };

        let mut order = Message::new(MsgType::NewOrderSingle);
        order.set_field(tags::SYMBOL, params.symbol.as_str());
        order.set_field(tags::ORD_TYPE, params.order_type.as_fix());
        if let Some(price) = price {
            order.set_field(tags::PRICE, price.to_string());
        }
        order.set_field(tags::SIDE, params.side.as_fix());
        order.set_field(tags::TIME_IN_FORCE, params.time_in_force.as_fix());
        order.set_field(tags::ORDER_QTY, quantity.to_string());
        order.set_field(tags::CL_ORD_ID, cl_ord_id.as_str());
        Ok(order)
    }

    /// Build an OrderCancelRequest for `orig_cl_ord_id` under a new request id.
    pub fn cancel_request(&self, orig_cl_ord_id: &ClOrdId, cl_ord_id: &ClOrdId) -> Message {
        let mut cancel = Message::new(MsgType::OrderCancelRequest);
        cancel.set_field(tags::ORIG_CL_ORD_ID, orig_cl_ord_id.as_str());
        cancel.set_field(tags::CL_ORD_ID, cl_ord_id.as_str());
        cancel
    }

    /// Build an OrderStatusRequest.
    pub fn status_request(&self, cl_ord_id: &ClOrdId) -> Message {
        let mut status = Message::new(MsgType::OrderStatusRequest);
        status.set_field(tags::CL_ORD_ID, cl_ord_id.as_str());
        status
    }
}
