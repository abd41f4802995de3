use super::print_json;
use anyhow::{Result, bail};
use planner_application::AppContext;
use planner_core::user::{LoginForm, RegisterForm};

pub async fn login(context: &AppContext, email: String, password: String) -> Result<()> {
    let user = context
        .session()
        .login(&LoginForm { email, password })
        .await?;
    print_json(&user)
}

pub async fn register(
    context: &AppContext,
    name: String,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<()> {
    let form = RegisterForm {
        name,
        email,
        password,
        confirm_password,
    };
    let user = context.session().register(&form).await?;
    print_json(&user)
}

pub fn logout(context: &AppContext) -> Result<()> {
    context.session().logout();
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(context: &AppContext, verify: bool) -> Result<()> {
    let session = context.session();

    if !session.is_authenticated() {
        bail!("Not signed in. Run `planner login` first.");
    }

    if verify {
        session.verify().await?;
    }

    print_json(&session.snapshot())
}
