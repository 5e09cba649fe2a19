//! An in-process stand-in for the storefront REST API.
//!
//! Speaks the same JSON as the real backend: `_id` fields, `{ message }`
//! error bodies, carts populated on reads and left as bare ids in mutation
//! responses, coupon amounts rounded to whole units.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use shopfront_core::{Price, Product, ProductId};

type ApiResult = Result<Response, Response>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[derive(Debug, Clone)]
struct CartLine {
    id: String,
    product: ProductId,
    quantity: i64,
    size: Option<String>,
}

#[derive(Debug, Clone)]
struct User {
    id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct Coupon {
    percent: f64,
    expired: bool,
}

#[derive(Default)]
struct Db {
    products: Vec<Product>,
    users: Vec<User>,
    carts: HashMap<String, Vec<CartLine>>,
    coupons: HashMap<String, Coupon>,
    orders: Vec<Value>,
    requests: Vec<String>,
    next_id: u64,
}

impl Db {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<User> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let id = token.strip_prefix("tok-")?;
        self.users.iter().find(|u| u.id == id).cloned()
    }

    fn auth(&self, headers: &HeaderMap) -> Result<User, Response> {
        self.user_for(headers)
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Not authorized, token failed"))
    }

    fn cart_json(&self, lines: &[CartLine], populate: bool) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|line| {
                let product = if populate {
                    self.product(&line.product).map_or(Value::Null, |p| {
                        json!({
                            "_id": p.id, "name": p.name, "brand": p.brand,
                            "category": p.category, "price": p.price, "image": p.image,
                        })
                    })
                } else {
                    json!(line.product)
                };
                json!({
                    "_id": line.id,
                    "product": product,
                    "quantity": line.quantity,
                    "size": line.size,
                })
            })
            .collect();
        json!({ "items": items })
    }

    fn auth_response(user: &User) -> Value {
        json!({
            "_id": user.id,
            "name": user.name,
            "email": user.email,
            "token": format!("tok-{}", user.id),
        })
    }
}

/// Handle on a running fake backend.
#[derive(Clone)]
pub struct FakeBackend {
    db: Arc<Mutex<Db>>,
    addr: SocketAddr,
}

impl FakeBackend {
    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let db = Arc::new(Mutex::new(Db::default()));
        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/search", get(search_products))
            .route("/api/products/suggest", get(suggest_products))
            .route("/api/products/category/{category}", get(category_products))
            .route("/api/products/{id}", get(product_detail))
            .route("/api/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
            .route("/api/cart/{item_id}", delete(remove_from_cart))
            .route("/api/coupons/apply", post(apply_coupon))
            .route("/api/orders", post(place_order))
            .route("/api/orders/history", get(order_history))
            .route("/api/orders/{id}/cancel", put(cancel_order))
            .route("/api/users/login", post(login))
            .route("/api/users/register", post(register))
            .with_state(db.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { db, addr }
    }

    /// Base URL of the API, ending in `/api`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a product with the given sizes and stock.
    pub fn add_product(&self, id: &str, name: &str, price: i64, sizes: &[&str]) {
        self.db().products.push(Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} description"),
            category: "Shoes".to_string(),
            brand: "Stride".to_string(),
            price: Price::from_units(price),
            stock: 10,
            sizes: sizes.iter().map(|s| (*s).to_string()).collect(),
            image: None,
            rating: 4.5,
            num_reviews: 2,
            is_available: true,
        });
    }

    /// Delete a product from the catalog, leaving cart lines dangling.
    pub fn delete_product(&self, id: &str) {
        self.db().products.retain(|p| p.id.as_str() != id);
    }

    pub fn add_coupon(&self, code: &str, percent: u32, expired: bool) {
        self.db().coupons.insert(
            code.to_string(),
            Coupon {
                percent: f64::from(percent),
                expired,
            },
        );
    }

    /// Create an account; returns its user id.
    pub fn add_user(&self, name: &str, email: &str, password: &str) -> String {
        let mut db = self.db();
        let id = db.id("u");
        db.users.push(User {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        id
    }

    /// Server cart of a user as `(product, size, quantity)`.
    #[must_use]
    pub fn cart_of(&self, user_id: &str) -> Vec<(String, Option<String>, i64)> {
        self.db()
            .carts
            .get(user_id)
            .map(|lines| {
                lines
                    .iter()
                    .map(|l| (l.product.to_string(), l.size.clone(), l.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Put a line straight into a user's server cart.
    pub fn seed_cart_line(&self, user_id: &str, product: &str, size: Option<&str>, quantity: i64) {
        let mut db = self.db();
        let id = db.id("line");
        db.carts.entry(user_id.to_string()).or_default().push(CartLine {
            id,
            product: ProductId::new(product),
            quantity,
            size: size.map(str::to_string),
        });
    }

    /// Every order placed so far, as sent back to the client.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.db().orders.clone()
    }

    /// Requests served, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.db().requests.clone()
    }

    /// Forget the request log.
    pub fn reset_requests(&self) {
        self.db().requests.clear();
    }
}

type Shared = State<Arc<Mutex<Db>>>;

fn lock(db: &Arc<Mutex<Db>>) -> MutexGuard<'_, Db> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log(db: &mut Db, method: &str, path: &str) {
    db.requests.push(format!("{method} {path}"));
}

fn summary(product: &Product) -> Value {
    json!({
        "_id": product.id, "name": product.name, "brand": product.brand,
        "category": product.category, "price": product.price, "image": product.image,
        "rating": product.rating, "numReviews": product.num_reviews,
    })
}

fn matches(product: &Product, query: &str) -> bool {
    let query = query.to_lowercase();
    product.name.to_lowercase().contains(&query) || product.brand.to_lowercase().contains(&query)
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn list_products(State(db): Shared) -> Json<Vec<Value>> {
    let mut db = lock(&db);
    log(&mut db, "GET", "/products");
    Json(db.products.iter().map(summary).collect())
}

async fn search_products(State(db): Shared, Query(query): Query<SearchQuery>) -> Json<Vec<Value>> {
    let mut db = lock(&db);
    log(&mut db, "GET", "/products/search");
    Json(
        db.products
            .iter()
            .filter(|p| matches(p, &query.q))
            .map(|p| {
                let mut value = summary(p);
                value["score"] = json!(1.0);
                value
            })
            .collect(),
    )
}

async fn suggest_products(State(db): Shared, Query(query): Query<SearchQuery>) -> Json<Vec<Value>> {
    let db = lock(&db);
    Json(
        db.products
            .iter()
            .filter(|p| matches(p, &query.q))
            .take(5)
            .map(|p| json!({ "_id": p.id, "name": p.name }))
            .collect(),
    )
}

async fn category_products(
    State(db): Shared,
    Path(category): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Value>> {
    let db = lock(&db);
    Json(
        db.products
            .iter()
            .filter(|p| p.category.eq_ignore_ascii_case(&category))
            .filter(|p| query.q.is_empty() || matches(p, &query.q))
            .map(summary)
            .collect(),
    )
}

async fn product_detail(State(db): Shared, Path(id): Path<String>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "GET", &format!("/products/{id}"));
    let product = db
        .product(&ProductId::new(&id))
        .cloned()
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Product not found"))?;
    let better_deals: Vec<Value> = db
        .products
        .iter()
        .filter(|p| p.category == product.category && p.price < product.price)
        .map(summary)
        .collect();
    Ok(Json(json!({ "product": product, "betterDeals": better_deals })).into_response())
}

async fn get_cart(State(db): Shared, headers: HeaderMap) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "GET", "/cart");
    let user = db.auth(&headers)?;
    let lines = db
        .carts
        .get(&user.id)
        .cloned()
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Cart not found"))?;
    Ok(Json(db.cart_json(&lines, true)).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: ProductId,
    quantity: i64,
    #[serde(default)]
    size: Option<String>,
}

async fn add_to_cart(State(db): Shared, headers: HeaderMap, Json(body): Json<AddBody>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "POST", "/cart");
    let user = db.auth(&headers)?;
    if db.product(&body.product_id).is_none() {
        return Err(error(StatusCode::NOT_FOUND, "Product not found"));
    }
    let id = db.id("line");
    let lines = db.carts.entry(user.id).or_default();
    match lines
        .iter_mut()
        .find(|l| l.product == body.product_id && l.size == body.size)
    {
        Some(line) => line.quantity += body.quantity,
        None => lines.push(CartLine {
            id,
            product: body.product_id,
            quantity: body.quantity,
            size: body.size,
        }),
    }
    let lines = lines.clone();
    Ok((StatusCode::CREATED, Json(db.cart_json(&lines, false))).into_response())
}

async fn remove_from_cart(
    State(db): Shared,
    headers: HeaderMap,
    Path(item_id): Path<String>,
) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "DELETE", &format!("/cart/{item_id}"));
    let user = db.auth(&headers)?;
    let lines = db
        .carts
        .get_mut(&user.id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Cart not found"))?;
    lines.retain(|l| l.id != item_id);
    Ok(Json(json!({ "message": "Item removed from cart" })).into_response())
}

async fn clear_cart(State(db): Shared, headers: HeaderMap) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "DELETE", "/cart");
    let user = db.auth(&headers)?;
    db.carts.remove(&user.id);
    Ok(Json(json!({ "message": "Cart cleared" })).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponBody {
    code: String,
    cart_total: f64,
}

async fn apply_coupon(State(db): Shared, headers: HeaderMap, Json(body): Json<CouponBody>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "POST", "/coupons/apply");
    db.auth(&headers)?;
    let coupon = db
        .coupons
        .get(&body.code.to_uppercase())
        .cloned()
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Invalid coupon code"))?;
    if coupon.expired {
        return Err(error(StatusCode::BAD_REQUEST, "Coupon has expired"));
    }
    let discount = (coupon.percent / 100.0 * body.cart_total).round();
    Ok(Json(json!({
        "discount": discount,
        "discountedTotal": body.cart_total - discount,
    }))
    .into_response())
}

async fn place_order(State(db): Shared, headers: HeaderMap, Json(body): Json<Value>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "POST", "/orders");
    let user = db.user_for(&headers);
    let items_missing = body["orderItems"].as_array().is_none_or(Vec::is_empty);
    if items_missing {
        return Err(error(StatusCode::BAD_REQUEST, "No order items"));
    }
    let id = db.id("order");
    let order = json!({
        "_id": id,
        "user": user.as_ref().map(|u| u.id.clone()),
        "guest": user.is_none(),
        "orderItems": body["orderItems"],
        "shippingAddress": body["shippingAddress"],
        "totalPrice": body["totalPrice"],
        "paymentMethod": body["paymentMethod"],
        "status": "Processing",
        "isPaid": false,
        "createdAt": "2026-10-19T09:30:00Z",
    });
    db.orders.push(order.clone());
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

async fn order_history(State(db): Shared, headers: HeaderMap) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "GET", "/orders/history");
    let user = db.auth(&headers)?;
    let orders: Vec<Value> = db
        .orders
        .iter()
        .filter(|o| o["user"] == json!(user.id))
        .cloned()
        .collect();
    Ok(Json(orders).into_response())
}

async fn cancel_order(State(db): Shared, headers: HeaderMap, Path(id): Path<String>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "PUT", &format!("/orders/{id}/cancel"));
    let user = db.auth(&headers)?;
    let order = db
        .orders
        .iter_mut()
        .find(|o| o["_id"] == json!(id) && o["user"] == json!(user.id) && o["status"] != "Cancelled")
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Order not found or already cancelled"))?;
    order["status"] = json!("Cancelled");
    Ok(Json(order.clone()).into_response())
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(db): Shared, Json(body): Json<LoginBody>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "POST", "/users/login");
    let user = db
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    Ok(Json(Db::auth_response(user)).into_response())
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn register(State(db): Shared, Json(body): Json<RegisterBody>) -> ApiResult {
    let mut db = lock(&db);
    log(&mut db, "POST", "/users/register");
    if db.users.iter().any(|u| u.email == body.email) {
        return Err(error(StatusCode::BAD_REQUEST, "User already exists"));
    }
    let id = db.id("u");
    let user = User {
        id,
        name: body.name,
        email: body.email,
        password: body.password,
    };
    let response = Db::auth_response(&user);
    db.users.push(user);
    Ok((StatusCode::CREATED, Json(response)).into_response())
}
