//! Session commands.

use secrecy::SecretString;

use shopfront_client::identity::AuthState;

use super::{CommandError, Shop, prompt};

/// Sign in. A guest cart is merged into the account cart.
///
/// # Errors
///
/// Returns an error for bad credentials or a failed request.
pub async fn login(shop: &mut Shop, email: &str) -> Result<(), CommandError> {
    let password = SecretString::from(prompt("Password")?);
    let identity = shop.identity.login(email, &password).await?;
    shop.sync_identity().await;

    println!("Signed in as {} <{}>.", identity.name, identity.email);
    let items = shop.cart.snapshot().item_count();
    if items > 0 {
        println!("Your cart has {items} item(s).");
    }
    Ok(())
}

/// Create an account and sign in to it.
///
/// # Errors
///
/// Returns the server's refusal, or an error if the request fails.
pub async fn register(shop: &mut Shop, name: &str, email: &str) -> Result<(), CommandError> {
    let password = SecretString::from(prompt("Choose a password")?);
    let identity = shop.identity.register(name, email, &password).await?;
    shop.sync_identity().await;

    println!("Welcome, {}! You are signed in as {}.", identity.name, identity.email);
    Ok(())
}

pub async fn logout(shop: &mut Shop) {
    shop.identity.logout();
    shop.sync_identity().await;
    println!("Signed out.");
}

pub fn whoami(shop: &Shop) {
    match shop.identity.current() {
        AuthState::SignedIn(session) => println!(
            "{} <{}> ({})",
            session.identity.name, session.identity.email, session.identity.id
        ),
        AuthState::Guest | AuthState::Resolving => println!("Not signed in."),
    }
}
