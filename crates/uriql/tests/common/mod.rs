//! Shared fixture model for pipeline tests
//!
//! A small commerce model: customers (with a derived preferred-customer
//! type and a stream property) owning orders, orders owning items.

use uriql::model::{EdmModel, EntitySet, EntityTypeBuilder, Multiplicity, PrimitiveKind};

pub fn commerce_model() -> EdmModel {
    EdmModel::builder()
        .entity_type(
            EntityTypeBuilder::new("Shop", "Customer")
                .structural("Name", PrimitiveKind::String)
                .structural("City", PrimitiveKind::String)
                .stream("Photo")
                .navigation("Orders", "Shop.Order", Multiplicity::Many)
                .navigation("Agent", "Shop.Agent", Multiplicity::ZeroOrOne)
                .build(),
        )
        .entity_type(
            EntityTypeBuilder::new("Shop", "PreferredCustomer")
                .base_type("Shop.Customer")
                .structural("Tier", PrimitiveKind::Int32)
                .navigation("Coupons", "Shop.Coupon", Multiplicity::Many)
                .build(),
        )
        .entity_type(
            EntityTypeBuilder::new("Shop", "Order")
                .structural("Amount", PrimitiveKind::Decimal)
                .structural("Placed", PrimitiveKind::DateTimeOffset)
                .navigation("Items", "Shop.Item", Multiplicity::Many)
                .navigation("Customer", "Shop.Customer", Multiplicity::One)
                .build(),
        )
        .entity_type(
            EntityTypeBuilder::new("Shop", "Item")
                .structural("Sku", PrimitiveKind::String)
                .structural("Quantity", PrimitiveKind::Int32)
                .build(),
        )
        .entity_type(
            EntityTypeBuilder::new("Shop", "Agent")
                .structural("Alias", PrimitiveKind::String)
                .build(),
        )
        .entity_type(EntityTypeBuilder::new("Shop", "Coupon").build())
        .entity_set(
            EntitySet::new("Customers", "Shop.Customer")
                .with_navigation_target("Orders", "Orders")
                .with_navigation_target("Agent", "Agents"),
        )
        .entity_set(
            EntitySet::new("Orders", "Shop.Order")
                .with_navigation_target("Items", "Items")
                .with_navigation_target("Customer", "Customers"),
        )
        .entity_set(EntitySet::new("Items", "Shop.Item"))
        .entity_set(EntitySet::new("Agents", "Shop.Agent"))
        .build()
}
