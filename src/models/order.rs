use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// A persisted delivery order.
///
/// `taken` only ever moves from `false` to `true`; the store owns that
/// transition.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DeliveryOrder {
    pub id: i64,
    pub distance: f64,
    #[sqlx(rename = "is_taken")]
    pub taken: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Unassigned,
    Taken,
}

impl OrderStatus {
    /// Wire tokens. The lower-case `taken` is what existing clients expect.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Unassigned => "UNASSIGN",
            OrderStatus::Taken => "taken",
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Keyword a courier sends to claim an order.
pub const CLAIM_KEYWORD: &str = "taken";

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: i64,
    #[serde(serialize_with = "serialize_distance")]
    pub distance: f64,
    pub status: OrderStatus,
}

impl From<&DeliveryOrder> for OrderView {
    fn from(order: &DeliveryOrder) -> Self {
        let status = if order.taken {
            OrderStatus::Taken
        } else {
            OrderStatus::Unassigned
        };

        Self {
            id: order.id,
            distance: order.distance,
            status,
        }
    }
}

// Whole meters go out as JSON integers (`500`, not `500.0`).
fn serialize_distance<S: Serializer>(distance: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if distance.fract() == 0.0 && distance.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*distance as i64)
    } else {
        serializer.serialize_f64(*distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(taken: bool, distance: f64) -> DeliveryOrder {
        DeliveryOrder {
            id: 7,
            distance,
            taken,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn projects_unassigned_and_taken_tokens() {
        let open = OrderView::from(&order(false, 500.0));
        let claimed = OrderView::from(&order(true, 500.0));

        assert_eq!(serde_json::to_value(&open).unwrap()["status"], "UNASSIGN");
        assert_eq!(serde_json::to_value(&claimed).unwrap()["status"], "taken");
    }

    #[test]
    fn whole_distance_serializes_as_integer() {
        let json = serde_json::to_string(&OrderView::from(&order(false, 500.0))).unwrap();
        assert_eq!(json, r#"{"id":7,"distance":500,"status":"UNASSIGN"}"#);
    }

    #[test]
    fn fractional_distance_keeps_its_fraction() {
        let json = serde_json::to_value(OrderView::from(&order(false, 1234.5))).unwrap();
        assert_eq!(json["distance"].as_f64(), Some(1234.5));
    }
}
