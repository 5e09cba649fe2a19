//! In-memory gateway and fixtures for cart store tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::watch;

use shopfront_core::{
    CartLineItem, CouponCode, CouponQuote, Email, Identity, LineId, Price, ProductId,
    ProductSnapshot, UserId, Variant,
};

use super::CartStore;
use crate::api::{ApiError, BearerToken, CartGateway, RemoteCart, RemoteLine};
use crate::error::CartError;
use crate::identity::{AuthState, Session};
use crate::storage::{LocalStore, MemoryStorage};

/// A gateway call, as recorded by [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch,
    Add { product: String, quantity: u32 },
    Remove(String),
    Clear,
    Coupon(String),
}

#[derive(Default)]
struct ServerState {
    catalog: HashMap<ProductId, ProductSnapshot>,
    /// `(code, percent, expired)`
    coupons: Vec<(String, u32, bool)>,
    lines: Vec<RemoteLine>,
    next_id: u32,
    fail: bool,
    /// Calls left before the server starts failing.
    budget: Option<usize>,
    calls: Vec<Call>,
}

/// A server cart held in memory. Clones share the same server.
///
/// Like the real backend it merges lines by product and size only, answers
/// mutations with unpopulated lines, and rounds coupon amounts to whole
/// units.
#[derive(Clone, Default)]
pub struct FakeGateway {
    server: Arc<Mutex<ServerState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(self, products: &[ProductSnapshot]) -> Self {
        {
            let mut server = self.lock();
            for product in products {
                server
                    .catalog
                    .insert(product.product_id.clone(), product.clone());
            }
        }
        self
    }

    pub fn with_coupon(self, code: &str, percent: u32, expired: bool) -> Self {
        self.lock()
            .coupons
            .push((code.to_string(), percent, expired));
        self
    }

    /// Make every call fail with a 503.
    pub fn fail_all(&self, fail: bool) {
        let mut server = self.lock();
        server.fail = fail;
        server.budget = None;
    }

    /// Answer `calls` more calls, then fail every call after them.
    pub fn fail_after(&self, calls: usize) {
        self.lock().budget = Some(calls);
    }

    /// Put units on the server cart directly, bypassing the call log.
    pub fn seed_line(&self, product: &str, size: Option<&str>, quantity: u32) {
        self.lock().upsert(&ProductId::new(product), size, quantity);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn server_lines(&self) -> Vec<RemoteLine> {
        self.lock().lines.clone()
    }

    pub fn server_line_id(&self, product: &str, size: Option<&str>) -> Option<LineId> {
        self.find(product, size).map(|line| line.line_id)
    }

    pub fn server_quantity(&self, product: &str, size: Option<&str>) -> Option<u32> {
        self.find(product, size).map(|line| line.quantity)
    }

    fn find(&self, product: &str, size: Option<&str>) -> Option<RemoteLine> {
        self.lock()
            .lines
            .iter()
            .find(|line| line.product_id.as_str() == product && line.size.as_deref() == size)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.server.lock().unwrap()
    }

    fn begin(&self, call: Call) -> Result<MutexGuard<'_, ServerState>, ApiError> {
        let mut server = self.lock();
        server.calls.push(call);
        match server.budget {
            Some(0) => server.fail = true,
            Some(left) => server.budget = Some(left - 1),
            None => {}
        }
        if server.fail {
            return Err(ApiError::Rejected {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(server)
    }
}

impl ServerState {
    fn upsert(&mut self, product_id: &ProductId, size: Option<&str>, quantity: u32) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| &line.product_id == product_id && line.size.as_deref() == size)
        {
            line.quantity += quantity;
            return;
        }
        self.next_id += 1;
        self.lines.push(RemoteLine {
            line_id: LineId::new(format!("srv-{}", self.next_id)),
            product_id: product_id.clone(),
            size: size.map(str::to_string),
            quantity,
        });
    }

    fn populated(&self) -> RemoteCart {
        let mut remote = RemoteCart::default();
        for line in &self.lines {
            match self.catalog.get(&line.product_id) {
                Some(product) => {
                    remote.lines.push(line.clone());
                    remote.items.push(CartLineItem::new(
                        line.line_id.clone(),
                        product.clone(),
                        Variant::new(line.size.clone(), None),
                        line.quantity,
                    ));
                }
                None => remote.unavailable.push(line.line_id.clone()),
            }
        }
        remote
    }

    fn unpopulated(&self) -> RemoteCart {
        RemoteCart {
            items: Vec::new(),
            lines: self.lines.clone(),
            unavailable: Vec::new(),
        }
    }
}

impl CartGateway for FakeGateway {
    async fn fetch_cart(&self, _token: &BearerToken) -> Result<RemoteCart, ApiError> {
        Ok(self.begin(Call::Fetch)?.populated())
    }

    async fn add_item(
        &self,
        _token: &BearerToken,
        product_id: &ProductId,
        quantity: u32,
        size: Option<&str>,
    ) -> Result<RemoteCart, ApiError> {
        let mut server = self.begin(Call::Add {
            product: product_id.to_string(),
            quantity,
        })?;
        server.upsert(product_id, size, quantity);
        Ok(server.unpopulated())
    }

    async fn remove_item(&self, _token: &BearerToken, line_id: &LineId) -> Result<(), ApiError> {
        let mut server = self.begin(Call::Remove(line_id.to_string()))?;
        server.lines.retain(|line| &line.line_id != line_id);
        Ok(())
    }

    async fn clear(&self, _token: &BearerToken) -> Result<(), ApiError> {
        self.begin(Call::Clear)?.lines.clear();
        Ok(())
    }

    async fn apply_coupon(
        &self,
        _token: &BearerToken,
        code: &CouponCode,
        subtotal: Price,
    ) -> Result<CouponQuote, CartError> {
        let server = self
            .begin(Call::Coupon(code.to_string()))
            .map_err(CartError::from_coupon_rejection)?;

        let Some((_, percent, expired)) = server
            .coupons
            .iter()
            .find(|(known, _, _)| known == code.as_str())
            .cloned()
        else {
            return Err(CartError::from_coupon_rejection(ApiError::NotFound(
                "Invalid coupon code".to_string(),
            )));
        };
        if expired {
            return Err(CartError::from_coupon_rejection(ApiError::Rejected {
                status: 400,
                message: "Coupon has expired".to_string(),
            }));
        }

        let total = subtotal.amount();
        let discount = total * Decimal::from(percent) / Decimal::from(100);
        let round = |d: Decimal| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Ok(CouponQuote {
            discount: Price::new(round(discount)),
            discounted_total: Price::new(round(total - discount)),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product(id: &str, price: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        brand: "Acme".to_string(),
        unit_price: Price::from_units(price),
        image: None,
    }
}

pub fn guest_line(line_id: &str, product_id: &str, price: i64, quantity: u32) -> CartLineItem {
    CartLineItem::new(
        LineId::new(line_id),
        product(product_id, price),
        Variant::default(),
        quantity,
    )
}

pub fn session() -> Session {
    Session {
        identity: Identity {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: Email::parse("asha@example.com").unwrap(),
        },
        token: BearerToken::new("tok-u1"),
    }
}

pub async fn guest_store(storage: MemoryStorage) -> CartStore<FakeGateway, MemoryStorage> {
    guest_store_with(FakeGateway::new(), storage).await
}

pub async fn guest_store_with(
    gateway: FakeGateway,
    storage: MemoryStorage,
) -> CartStore<FakeGateway, MemoryStorage> {
    let (_tx, mut rx) = watch::channel(AuthState::Guest);
    CartStore::start(gateway, LocalStore::new(storage), &mut rx).await
}

pub async fn signed_in_store(
    gateway: FakeGateway,
    storage: MemoryStorage,
) -> CartStore<FakeGateway, MemoryStorage> {
    let (_tx, mut rx) = watch::channel(AuthState::SignedIn(session()));
    CartStore::start(gateway, LocalStore::new(storage), &mut rx).await
}
