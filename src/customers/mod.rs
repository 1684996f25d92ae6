//! Customers and orders
//!
//! Placing an order updates the customer's spend statistics before the order
//! itself is stored.

pub mod validation;

use crate::error::{Error, Result};
use crate::models::{Customer, CustomerId, Order};
use crate::storage::{CustomerFilter, SharedStore};

pub use validation::{NewCustomer, NewOrder, ValidCustomer, ValidOrder};

/// Customer and order operations
#[derive(Clone)]
pub struct CustomerService {
    store: SharedStore,
}

impl CustomerService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Validate and store a new customer
    pub async fn create_customer(&self, new: NewCustomer) -> Result<Customer> {
        let valid = new.validate()?;
        let customer = Customer::new(valid.name, valid.email, &valid.password);
        self.store.save_customer(&customer).await?;

        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Validate and store an order, updating the customer's statistics
    pub async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let valid = new.validate()?;
        let customer_id = CustomerId::parse(&valid.customer)
            .ok_or_else(|| Error::bad_request("Invalid customer ID."))?;

        let mut customer = self
            .store
            .find_customer(&customer_id)
            .await?
            .ok_or_else(|| Error::not_found("Customer", &customer_id))?;

        customer.record_purchase(valid.price, valid.quantity);
        self.store.save_customer(&customer).await?;

        let order = Order::new(customer_id, valid.product, valid.quantity, valid.price);
        self.store.save_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            customer_id = %order.customer,
            total = order.total(),
            "Order created"
        );
        Ok(order)
    }

    /// Customers matching a filter
    pub async fn filter_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        self.store.filter_customers(filter).await
    }
}
