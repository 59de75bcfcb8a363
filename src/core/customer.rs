//! Customer business logic - Resolves shoppers to customer records.
//!
//! Two identities reach the store: authenticated principals (identified by the
//! upstream auth layer's user id) and guests, who are identified only by the contact
//! details they type at checkout. Both resolve to a single `customers` row, and the
//! unique email column keeps repeated guest checkouts from creating duplicates.

use crate::{
    entities::{Customer, Order, ShippingAddress, customer, order, shipping_address},
    errors::{Error, Result},
};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Identity asserted by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable identifier of the authenticated user
    pub user_id: String,
    /// Email address on the account
    pub email: String,
    /// Display name, if known
    pub name: Option<String>,
}

/// Retrieves a customer by ID.
pub async fn get_customer_by_id<C>(db: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the customer linked to an authenticated principal.
pub async fn get_customer_by_user<C>(db: &C, user_id: &str) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .filter(customer::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a customer by email address.
pub async fn get_customer_by_email<C>(db: &C, email: &str) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .filter(customer::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Trims and lowercases an email address, rejecting obviously malformed input.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::invalid_input(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

fn normalize_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Creates a customer record.
pub async fn create_customer<C>(
    db: &C,
    user_id: Option<String>,
    name: Option<&str>,
    email: &str,
) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    let customer = customer::ActiveModel {
        user_id: Set(user_id),
        name: Set(normalize_name(name)),
        email: Set(normalize_email(email)?),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    customer.insert(db).await.map_err(Into::into)
}

/// Looks up the customer already linked to a principal without creating or linking one.
pub async fn find_account<C>(db: &C, principal: &Principal) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    get_customer_by_user(db, &principal.user_id).await
}

/// Resolves the customer for an authenticated principal, linking accounts on first use.
///
/// Resolution order:
/// 1. The customer already linked to `user_id`
/// 2. An unlinked customer with the same email (e.g. from an earlier guest checkout), which
///    becomes linked to `user_id`
/// 3. A newly created customer
///
/// # Errors
/// Returns `InvalidInput` if the email belongs to a customer linked to a different user.
pub async fn resolve_account<C>(db: &C, principal: &Principal) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_customer_by_user(db, &principal.user_id).await? {
        return Ok(existing);
    }

    let email = normalize_email(&principal.email)?;
    match get_customer_by_email(db, &email).await? {
        Some(existing) if existing.user_id.is_some() => Err(Error::invalid_input(format!(
            "email {email} is linked to another account"
        ))),
        Some(existing) => {
            info!(
                "Linking customer {} to user {}",
                existing.id, principal.user_id
            );
            let name = existing.name.clone();
            let mut active: customer::ActiveModel = existing.into();
            active.user_id = Set(Some(principal.user_id.clone()));
            if name.is_none() {
                active.name = Set(normalize_name(principal.name.as_deref()));
            }
            active.update(db).await.map_err(Into::into)
        }
        None => {
            create_customer(
                db,
                Some(principal.user_id.clone()),
                principal.name.as_deref(),
                &email,
            )
            .await
        }
    }
}

/// Finds or creates the customer for guest checkout contact details.
///
/// The insert is a no-op when the email already exists, so concurrent checkouts with
/// the same email converge on one row. The stored name is refreshed to the latest one given.
///
/// # Errors
/// Returns `InvalidInput` if the email belongs to a registered account; its owner must
/// sign in to check out with it.
pub async fn get_or_create_guest<C>(db: &C, name: &str, email: &str) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    let email = normalize_email(email)?;
    let name = normalize_name(Some(name));

    let candidate = customer::ActiveModel {
        user_id: Set(None),
        name: Set(name.clone()),
        email: Set(email.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let inserted = Customer::insert(candidate)
        .on_conflict(OnConflict::new().do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    debug!("Guest customer upsert for {} inserted {} row(s)", email, inserted);

    let existing = get_customer_by_email(db, &email)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            identity: email.clone(),
        })?;

    if existing.user_id.is_some() {
        return Err(Error::invalid_input(format!(
            "email {email} belongs to a registered account, sign in to check out"
        )));
    }

    if name.is_some() && existing.name != name {
        let mut active: customer::ActiveModel = existing.into();
        active.name = Set(name);
        return active.update(db).await.map_err(Into::into);
    }
    Ok(existing)
}

/// Deletes a customer while keeping their orders and shipping addresses.
///
/// Orders and addresses stay in place with a NULL customer reference.
pub async fn delete_customer(db: &DatabaseConnection, customer_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let customer = get_customer_by_id(&txn, customer_id)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            identity: customer_id.to_string(),
        })?;

    Order::update_many()
        .col_expr(order::Column::CustomerId, Expr::value(Option::<i64>::None))
        .filter(order::Column::CustomerId.eq(customer_id))
        .exec(&txn)
        .await?;
    ShippingAddress::update_many()
        .col_expr(
            shipping_address::Column::CustomerId,
            Expr::value(Option::<i64>::None),
        )
        .filter(shipping_address::Column::CustomerId.eq(customer_id))
        .exec(&txn)
        .await?;

    customer.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted customer {}", customer_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn principal(user_id: &str, email: &str) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            email: email.to_string(),
            name: Some("Dana".to_string()),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.com ").unwrap(), "a@b.com");
        assert!(matches!(
            normalize_email("not-an-email"),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(normalize_email("@b.com"), Err(Error::InvalidInput { .. })));
        assert!(matches!(normalize_email("a@"), Err(Error::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_guest_resolution_deduplicates_by_email() -> Result<()> {
        let db = setup_test_db().await?;

        let first = get_or_create_guest(&db, "Alex", "a@b.com").await?;
        let second = get_or_create_guest(&db, "Alex R.", "A@B.com").await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Alex R."));
        assert_eq!(Customer::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_resolution_keeps_name_when_blank() -> Result<()> {
        let db = setup_test_db().await?;

        get_or_create_guest(&db, "Alex", "a@b.com").await?;
        let again = get_or_create_guest(&db, "  ", "a@b.com").await?;
        assert_eq!(again.name.as_deref(), Some("Alex"));

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_cannot_use_registered_email() -> Result<()> {
        let (db, customer) = setup_with_customer().await?;

        let result = get_or_create_guest(&db, "Impostor", "Shopper@Example.com").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        // The account is untouched
        let stored = get_customer_by_id(&db, customer.id).await?.unwrap();
        assert_eq!(stored.name.as_deref(), Some("Test Shopper"));
        assert_eq!(Customer::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_find_account_never_writes() -> Result<()> {
        let db = setup_test_db().await?;
        let dana = principal("user-1", "dana@example.com");

        assert!(find_account(&db, &dana).await?.is_none());
        assert_eq!(Customer::find().count(&db).await?, 0);

        let created = resolve_account(&db, &dana).await?;
        assert_eq!(find_account(&db, &dana).await?, Some(created));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_account_creates_then_reuses() -> Result<()> {
        let db = setup_test_db().await?;

        let created = resolve_account(&db, &principal("user-1", "dana@example.com")).await?;
        assert_eq!(created.user_id.as_deref(), Some("user-1"));
        assert_eq!(created.name.as_deref(), Some("Dana"));

        let again = resolve_account(&db, &principal("user-1", "other@example.com")).await?;
        assert_eq!(again.id, created.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_account_links_guest_customer() -> Result<()> {
        let db = setup_test_db().await?;

        let guest = get_or_create_guest(&db, "", "dana@example.com").await?;
        assert!(guest.user_id.is_none());

        let linked = resolve_account(&db, &principal("user-1", "dana@example.com")).await?;
        assert_eq!(linked.id, guest.id);
        assert_eq!(linked.user_id.as_deref(), Some("user-1"));
        assert_eq!(linked.name.as_deref(), Some("Dana"));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_account_rejects_email_of_other_user() -> Result<()> {
        let db = setup_test_db().await?;

        resolve_account(&db, &principal("user-1", "dana@example.com")).await?;
        let result = resolve_account(&db, &principal("user-2", "dana@example.com")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_customer_keeps_orders() -> Result<()> {
        let (db, customer, product, _) = setup_with_customer_and_products().await?;

        crate::core::cart::add_or_remove_item(
            &db,
            customer.id,
            product.id,
            crate::core::cart::CartAction::Add,
        )
        .await?;

        delete_customer(&db, customer.id).await?;
        assert!(get_customer_by_id(&db, customer.id).await?.is_none());

        let orders = Order::find().all(&db).await?;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].customer_id, None);

        Ok(())
    }
}
