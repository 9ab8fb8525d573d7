//! Customer entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use domain::models::customer::{Customer, CustomerSegment};

/// Database row mapping for the customers table.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub customer_segment: String,
    pub total_bookings: i32,
    pub recent_bookings: i32,
    pub average_party_size: f64,
    pub last_booking_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerEntity> for Customer {
    fn from(entity: CustomerEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            customer_segment: CustomerSegment::parse(&entity.customer_segment)
                .unwrap_or(CustomerSegment::New),
            total_bookings: entity.total_bookings,
            recent_bookings: entity.recent_bookings,
            average_party_size: entity.average_party_size,
            last_booking_date: entity.last_booking_date,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_domain() {
        let entity = CustomerEntity {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            customer_segment: "vip".to_string(),
            total_bookings: 12,
            recent_bookings: 4,
            average_party_size: 3.2,
            last_booking_date: None,
            created_at: Utc::now(),
        };
        let customer: Customer = entity.into();
        assert_eq!(customer.customer_segment, CustomerSegment::Vip);
        assert_eq!(customer.total_bookings, 12);
    }
}
