//! The cart state store.
//!
//! [`CartStore`] owns the [`CartState`] of one shopper and is the only
//! thing that changes it. Every change is a [`CartAction`] applied by the
//! pure reducer in `shopfront-core`; this module adds the side effects:
//!
//! - guests: the cart is persisted locally after every change
//! - signed-in shoppers: every change is mirrored to the server cart
//! - both: the applied coupon is persisted locally
//!
//! # Ordering
//!
//! A store only exists once [`CartStore::start`] has seen identity resolve
//! and loaded (or merged) the cart, so no mutation can run before the
//! startup load. Mutations take `&mut self` and await their server mirror
//! before returning, which serializes them: the server sees requests in
//! the order they were issued.
//!
//! # Failures
//!
//! Local state is applied first and stays the source of truth. A failed
//! mirror call is logged and not rolled back, so the server cart may drift
//! until the next load. Only [`CartStore::apply_coupon`] reports an error.

mod reconcile;

use std::num::NonZeroU32;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use shopfront_core::{
    AppliedCoupon, CartAction, CartLineItem, CartState, CouponCode, CouponSnapshot, LineId,
    ProductId, ProductSnapshot, Variant,
};

use crate::api::{BearerToken, CartGateway};
use crate::error::{CartError, add_breadcrumb};
use crate::identity::{AuthState, Session};
use crate::storage::{LocalStore, Storage};

/// The cart of one shopper, guest or signed in.
pub struct CartStore<G, S> {
    gateway: G,
    local: LocalStore<S>,
    session: Option<Session>,
    state: watch::Sender<CartState>,
}

impl<G: CartGateway, S: Storage> CartStore<G, S> {
    /// Wait for identity to resolve, then load the cart.
    ///
    /// A guest gets the locally stored cart. A signed-in shopper gets the
    /// server cart, with any stored guest lines merged into it first. The
    /// coupon persisted by an earlier session is restored if it still fits
    /// the loaded cart.
    pub async fn start(
        gateway: G,
        local: LocalStore<S>,
        identity: &mut watch::Receiver<AuthState>,
    ) -> Self {
        let auth = match identity.wait_for(AuthState::is_resolved).await {
            Ok(state) => (*state).clone(),
            Err(_) => {
                warn!("Identity provider went away before resolving; continuing as guest");
                AuthState::Guest
            }
        };

        let saved_coupon = local.coupon();
        let (state, _) = watch::channel(CartState::new());
        let mut store = Self {
            gateway,
            local,
            session: None,
            state,
        };

        store.enter(auth).await;
        if let Some(snapshot) = saved_coupon {
            store.restore_coupon(snapshot);
        }
        store
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Follow state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// The session the cart is bound to; `None` for a guest cart.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The local records this store persists to.
    #[must_use]
    pub const fn local(&self) -> &LocalStore<S> {
        &self.local
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// React to an identity change.
    ///
    /// Guest to signed-in merges the guest cart into the server cart.
    /// Signed-in to guest (logout) switches back to the locally stored
    /// guest cart. A refreshed token for the same shopper only replaces the
    /// token.
    pub async fn handle_identity(&mut self, auth: &AuthState) {
        match (auth, self.session.as_mut()) {
            (AuthState::Resolving, _) | (AuthState::Guest, None) => return,
            (AuthState::SignedIn(next), Some(current))
                if next.identity.id == current.identity.id =>
            {
                current.token = next.token.clone();
                return;
            }
            _ => {}
        }
        self.enter(auth.clone()).await;
    }

    async fn enter(&mut self, auth: AuthState) {
        match auth {
            AuthState::SignedIn(session) => {
                info!(user_id = %session.identity.id, "Loading server cart");
                let token = session.token.clone();
                self.session = Some(session);
                self.reconcile(&token).await;
            }
            AuthState::Guest | AuthState::Resolving => {
                self.session = None;
                let items = self.local.guest_cart();
                debug!(lines = items.len(), "Loading guest cart");
                self.dispatch(CartAction::Load(items));
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product in a variant.
    ///
    /// Returns the id of the line now holding it: the server's id when the
    /// mirror call told us one, a client-generated id otherwise.
    pub async fn add_item(&mut self, product: ProductSnapshot, variant: Variant) -> Option<LineId> {
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product.product_id.as_str())]),
        );

        let product_id = product.product_id.clone();
        let temp_id = LineId::for_guest(&product_id, &variant, Utc::now().timestamp_millis());
        if !self.dispatch(CartAction::AddItem(CartLineItem::new(
            temp_id,
            product,
            variant.clone(),
            1,
        ))) {
            warn!(product_id = %product_id, "Cart refused line");
            return None;
        }

        if let Some(token) = self.token() {
            match self
                .gateway
                .add_item(&token, &product_id, 1, variant.size.as_deref())
                .await
            {
                Ok(remote) => {
                    if let (Some(local_id), Some(server_id)) = (
                        self.line_id_of(&product_id, &variant),
                        remote.line_id_for(&product_id, variant.size.as_deref()),
                    ) {
                        self.adopt(local_id, server_id.clone());
                    }
                }
                Err(e) => warn!(error = %e, product_id = %product_id, "Failed to sync add with server cart"),
            }
        }

        self.line_id_of(&product_id, &variant)
    }

    /// Delete a line. Unknown ids are a no-op.
    pub async fn remove_item(&mut self, line_id: &LineId) {
        add_breadcrumb("cart", "Removed item", Some(&[("line_id", line_id.as_str())]));

        if !self.dispatch(CartAction::RemoveItem(line_id.clone())) {
            debug!(line_id = %line_id, "Remove of unknown line ignored");
            return;
        }

        if let Some(token) = self.token()
            && let Err(e) = self.gateway.remove_item(&token, line_id).await
        {
            warn!(error = %e, line_id = %line_id, "Failed to remove from server cart");
        }
    }

    /// Set the quantity of a line. Zero or less removes it; anything above
    /// `u32::MAX` is ignored.
    pub async fn update_quantity(&mut self, line_id: &LineId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(line_id).await;
            return;
        }
        let Some(quantity) = u32::try_from(quantity).ok().and_then(NonZeroU32::new) else {
            debug!(line_id = %line_id, quantity, "Quantity out of range ignored");
            return;
        };
        let Some(previous) = self.state.borrow().line(line_id).cloned() else {
            debug!(line_id = %line_id, "Quantity update of unknown line ignored");
            return;
        };

        add_breadcrumb("cart", "Updated quantity", Some(&[("line_id", line_id.as_str())]));
        self.dispatch(CartAction::SetQuantity {
            line_id: line_id.clone(),
            quantity,
        });

        if let Some(token) = self.token() {
            self.mirror_quantity(&token, &previous, quantity.get()).await;
        }
    }

    /// Empty the cart.
    pub async fn clear(&mut self) {
        add_breadcrumb("cart", "Cleared cart", None);
        self.dispatch(CartAction::Clear);

        if let Some(token) = self.token()
            && let Err(e) = self.gateway.clear(&token).await
        {
            warn!(error = %e, "Failed to clear server cart");
        }
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Apply a coupon code to the current subtotal.
    ///
    /// The discount comes from the pricing endpoint. On failure the message
    /// meant for the shopper is also recorded as the cart's coupon error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AuthRequired` for a guest, `CartError::EmptyCart`
    /// for an empty cart, and the classified gateway failure otherwise.
    pub async fn apply_coupon(&mut self, code: &str) -> Result<AppliedCoupon, CartError> {
        self.dispatch(CartAction::ClearCouponError);

        let result = self.price_coupon(code).await;
        match &result {
            Ok(coupon) => {
                add_breadcrumb("cart", "Applied coupon", Some(&[("code", coupon.code.as_str())]));
                info!(code = %coupon.code, discount = %coupon.discount, "Coupon applied");
                self.dispatch(CartAction::CouponApplied(coupon.clone()));
            }
            Err(e) => {
                debug!(error = %e, "Coupon rejected");
                self.dispatch(CartAction::CouponFailed(e.user_message()));
            }
        }
        result
    }

    /// Drop the applied coupon. Items are untouched.
    pub fn remove_coupon(&mut self) {
        add_breadcrumb("cart", "Removed coupon", None);
        self.dispatch(CartAction::RemoveCoupon);
    }

    async fn price_coupon(&self, code: &str) -> Result<AppliedCoupon, CartError> {
        let Some(token) = self.token() else {
            return Err(CartError::AuthRequired);
        };
        let subtotal = {
            let state = self.state.borrow();
            if state.is_empty() {
                return Err(CartError::EmptyCart);
            }
            state.subtotal()
        };
        let code = CouponCode::parse(code)
            .map_err(|_| CartError::InvalidCoupon("Please enter a coupon code.".to_string()))?;

        let quote = self.gateway.apply_coupon(&token, &code, subtotal).await?;

        if quote.discount.is_negative() || quote.discount > subtotal {
            return Err(CartError::CouponLookupFailed(format!(
                "Coupon discount {} does not fit a subtotal of {subtotal}",
                quote.discount
            )));
        }
        let expected = subtotal - quote.discount;
        if quote.discounted_total != expected {
            // Server rounds discount and total separately.
            warn!(
                server_total = %quote.discounted_total,
                final_total = %expected,
                "Server total disagrees with subtotal minus discount; using the latter"
            );
        }

        Ok(AppliedCoupon {
            code,
            discount: quote.discount,
        })
    }

    fn restore_coupon(&mut self, snapshot: CouponSnapshot) {
        let code = snapshot.code.clone();
        if self.dispatch(CartAction::RestoreCoupon(snapshot)) {
            debug!(code = %code, "Restored applied coupon");
        } else {
            debug!(code = %code, "Discarding coupon record that no longer fits the cart");
            if let Err(e) = self.local.save_coupon(None) {
                warn!(error = %e, "Failed to remove coupon record");
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn token(&self) -> Option<BearerToken> {
        self.session.as_ref().map(|session| session.token.clone())
    }

    fn line_id_of(&self, product_id: &ProductId, variant: &Variant) -> Option<LineId> {
        self.state
            .borrow()
            .find_configuration(product_id, variant)
            .map(|item| item.line_id.clone())
    }

    /// Apply an action, publish the result and persist it.
    fn dispatch(&mut self, action: CartAction) -> bool {
        let changed = self.state.send_if_modified(|state| state.apply(action));
        if changed {
            self.persist();
        }
        changed
    }

    fn persist(&self) {
        let state = self.state.borrow();
        if self.session.is_none()
            && let Err(e) = self.local.save_guest_cart(state.items())
        {
            warn!(error = %e, "Failed to persist guest cart");
        }
        if let Err(e) = self.local.save_coupon(state.coupon_snapshot().as_ref()) {
            warn!(error = %e, "Failed to persist applied coupon");
        }
    }

    fn adopt(&mut self, from: LineId, to: LineId) {
        if from == to {
            return;
        }
        let (from_id, to_id) = (from.to_string(), to.to_string());
        if !self.dispatch(CartAction::AdoptLineId { from, to }) {
            // The server merged two local lines (it has no color selector).
            debug!(from = %from_id, to = %to_id, "Keeping local line id");
        }
    }

    /// Bring the server line in line with a local quantity change.
    ///
    /// An increase posts the difference. A decrease has no server call of
    /// its own, so the line is removed and re-added with the new quantity.
    async fn mirror_quantity(&mut self, token: &BearerToken, previous: &CartLineItem, quantity: u32) {
        let size = previous.variant.size.as_deref();
        let result = if quantity > previous.quantity {
            self.gateway
                .add_item(token, &previous.product_id, quantity - previous.quantity, size)
                .await
        } else if quantity < previous.quantity {
            match self.gateway.remove_item(token, &previous.line_id).await {
                Ok(()) => {
                    self.gateway
                        .add_item(token, &previous.product_id, quantity, size)
                        .await
                }
                Err(e) => Err(e),
            }
        } else {
            return;
        };

        match result {
            Ok(remote) => {
                if let Some(server_id) = remote.line_id_for(&previous.product_id, size) {
                    self.adopt(previous.line_id.clone(), server_id.clone());
                }
            }
            Err(e) => warn!(
                error = %e,
                line_id = %previous.line_id,
                "Failed to sync quantity with server cart"
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing;
