//! Session commands: login, logout, whoami.

use sandpiper_client::StorefrontRuntime;
use sandpiper_core::Email;

/// Log in and report the authenticated identity.
#[allow(clippy::print_stdout)]
pub async fn login(
    runtime: &mut StorefrontRuntime,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let user = runtime.login(&email, password).await?;

    println!("Logged in as {} <{}> ({:?})", user.name, user.email, user.role);
    Ok(())
}

/// Create an account and report the authenticated identity.
#[allow(clippy::print_stdout)]
pub async fn register(
    runtime: &mut StorefrontRuntime,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let user = runtime
        .api()
        .register(first_name, last_name, &email, password)
        .await?;

    println!("Registered {} <{}>", user.name, user.email);
    Ok(())
}

/// Discard stored credentials. Cart contents are kept.
#[allow(clippy::print_stdout)]
pub fn logout(runtime: &mut StorefrontRuntime) -> Result<(), Box<dyn std::error::Error>> {
    runtime.logout()?;
    println!("Logged out");
    Ok(())
}

/// Show the user behind the stored credentials.
#[allow(clippy::print_stdout)]
pub async fn whoami(runtime: &mut StorefrontRuntime) -> Result<(), Box<dyn std::error::Error>> {
    match runtime.restore_session().await? {
        Some(user) => println!("{} <{}> ({:?})", user.name, user.email, user.role),
        None => println!("Not logged in"),
    }
    Ok(())
}
