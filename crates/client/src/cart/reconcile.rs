//! Merging a guest cart into the server cart at sign-in.

use tracing::{info, warn};

use shopfront_core::{CartAction, CartLineItem, UserId};

use super::CartStore;
use crate::api::{ApiError, BearerToken, CartGateway, RemoteCart};
use crate::error::add_breadcrumb;
use crate::storage::Storage;

impl<G: CartGateway, S: Storage> CartStore<G, S> {
    /// Push stored guest lines to the server cart, then load the server cart.
    ///
    /// Lines go up one at a time and each accepted line id is recorded, so a
    /// failure part way through never sends a line twice on the next
    /// attempt. The server adds quantities for a product and size it already
    /// holds. The guest cart is only deleted once the server cart has been
    /// loaded.
    ///
    /// If any step fails the cart shows the whole guest cart as it was.
    pub(super) async fn reconcile(&mut self, token: &BearerToken) {
        let guest = self.local.guest_cart();
        if !guest.is_empty() {
            info!(lines = guest.len(), "Merging guest cart into server cart");
            add_breadcrumb("cart", "Merging guest cart", None);
        }

        let user = match &self.session {
            Some(session) => session.identity.id.clone(),
            None => return,
        };
        if let Err(e) = self.push_guest_lines(token, &user, &guest).await {
            warn!(error = %e, lines = guest.len(), "Failed to merge guest cart; showing guest lines");
            self.dispatch(CartAction::Load(guest));
            return;
        }

        match self.gateway.fetch_cart(token).await {
            Ok(remote) => {
                if let Err(e) = self.local.finish_merge() {
                    warn!(error = %e, "Failed to clear merged guest cart");
                }
                self.load_remote(remote);
            }
            Err(e) => {
                warn!(error = %e, lines = guest.len(), "Failed to load server cart; showing guest lines");
                self.dispatch(CartAction::Load(guest));
            }
        }
    }

    async fn push_guest_lines(
        &self,
        token: &BearerToken,
        user: &UserId,
        guest: &[CartLineItem],
    ) -> Result<(), ApiError> {
        let mut merged = self.local.merged_lines(user);
        for line in guest {
            if merged.contains(&line.line_id) {
                continue;
            }
            self.gateway
                .add_item(
                    token,
                    &line.product_id,
                    line.quantity,
                    line.variant.size.as_deref(),
                )
                .await?;
            merged.push(line.line_id.clone());
            if let Err(e) = self.local.save_merged_lines(user, &merged) {
                warn!(error = %e, "Failed to record merge progress");
            }
        }
        Ok(())
    }

    fn load_remote(&mut self, remote: RemoteCart) {
        if !remote.unavailable.is_empty() {
            warn!(
                lines = remote.unavailable.len(),
                "Server cart holds products that no longer exist; skipping them"
            );
        }
        self.dispatch(CartAction::Load(remote.items));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::testing::*;
    use crate::storage::{LocalStore, MemoryStorage};
    use shopfront_core::{LineId, Price};

    #[tokio::test]
    async fn test_merge_scenario() {
        let storage = MemoryStorage::new();
        LocalStore::new(storage.clone())
            .save_guest_cart(&[guest_line("g1", "A", 300, 2)])
            .unwrap();
        let gateway = FakeGateway::new().with_catalog(&[product("A", 300)]);

        let store = signed_in_store(gateway.clone(), storage.clone()).await;

        assert_eq!(gateway.server_quantity("A", None), Some(2));
        assert!(LocalStore::new(storage).guest_cart().is_empty());

        let state = store.snapshot();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].line_id, gateway.server_line_id("A", None).unwrap());
        assert_eq!(state.subtotal(), Price::from_units(600));
    }

    #[tokio::test]
    async fn test_merge_adds_to_existing_server_line() {
        let storage = MemoryStorage::new();
        LocalStore::new(storage.clone())
            .save_guest_cart(&[guest_line("g1", "A", 300, 2)])
            .unwrap();
        let gateway = FakeGateway::new().with_catalog(&[product("A", 300)]);
        gateway.seed_line("A", None, 1);

        let store = signed_in_store(gateway.clone(), storage).await;

        assert_eq!(gateway.server_lines().len(), 1);
        assert_eq!(store.snapshot().item_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_merge_is_not_repeated() {
        let storage = MemoryStorage::new();
        LocalStore::new(storage.clone())
            .save_guest_cart(&[guest_line("g1", "A", 100, 1), guest_line("g2", "B", 200, 1)])
            .unwrap();
        let gateway = FakeGateway::new().with_catalog(&[product("A", 100), product("B", 200)]);

        // The server takes the first line, then goes down.
        gateway.fail_after(1);
        let store = signed_in_store(gateway.clone(), storage.clone()).await;
        let shown: Vec<_> = store
            .snapshot()
            .items()
            .iter()
            .map(|line| line.product_id.as_str().to_string())
            .collect();
        assert_eq!(shown, vec!["A", "B"]);
        assert_eq!(store.snapshot().subtotal(), Price::from_units(300));
        let local = LocalStore::new(storage.clone());
        assert_eq!(local.guest_cart().len(), 2);
        assert_eq!(local.merged_lines(&session().identity.id), vec![LineId::new("g1")]);

        gateway.fail_all(false);
        let store = signed_in_store(gateway.clone(), storage.clone()).await;
        assert_eq!(gateway.server_quantity("A", None), Some(1));
        assert_eq!(gateway.server_quantity("B", None), Some(1));
        assert_eq!(store.snapshot().item_count(), 2);
        let local = LocalStore::new(storage);
        assert!(local.guest_cart().is_empty());
        assert!(local.merged_lines(&session().identity.id).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_cart_keeps_guest_lines() {
        let storage = MemoryStorage::new();
        LocalStore::new(storage.clone())
            .save_guest_cart(&[guest_line("g1", "A", 300, 2)])
            .unwrap();
        let gateway = FakeGateway::new().with_catalog(&[product("A", 300)]);

        // The line is accepted, the cart fetch that follows is not.
        gateway.fail_after(1);
        let store = signed_in_store(gateway.clone(), storage.clone()).await;

        let state = store.snapshot();
        assert_eq!(state.item_count(), 2);
        assert_eq!(state.items()[0].line_id, LineId::new("g1"));
        assert_eq!(LocalStore::new(storage.clone()).guest_cart().len(), 1);

        // The retry only fetches; the line is not added a second time.
        gateway.fail_all(false);
        let store = signed_in_store(gateway.clone(), storage.clone()).await;
        assert_eq!(gateway.server_quantity("A", None), Some(2));
        assert_eq!(store.snapshot().item_count(), 2);
        assert!(LocalStore::new(storage).guest_cart().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_products_are_skipped() {
        let gateway = FakeGateway::new().with_catalog(&[product("A", 100)]);
        gateway.seed_line("A", None, 1);
        gateway.seed_line("GONE", None, 4);

        let store = signed_in_store(gateway, MemoryStorage::new()).await;

        let state = store.snapshot();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.item_count(), 1);
    }
}
