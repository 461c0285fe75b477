//! Login, registration, logout, and whoami.

use taskboard_core::models::{LoginInput, LoginResponse, RegisterInput, User};
use taskboard_core::{SessionStatus, SubmitOptions};

use crate::cli::{LoginArgs, RegisterArgs};
use crate::error::CliError;
use crate::output;

use super::{Ctx, util};

fn user_detail(u: &User) -> String {
    let mut out = format!("{} <{}>\nrole: {}\nid:   {}", u.name, u.email, u.role, u.id);
    if let Some(verified) = u.email_verified_at {
        out.push_str(&format!("\nverified: {}", verified.format("%Y-%m-%d")));
    }
    out
}

/// Store the session from a login/register response and report it.
fn establish(ctx: &Ctx, response: &taskboard_core::ApiResponse) -> Result<(), CliError> {
    let login: LoginResponse = response.json()?;
    let name = login.user.name.clone();
    ctx.session.establish(login)?;
    output::print_status(&format!("Logged in as {name}"), ctx.quiet);
    Ok(())
}

pub async fn login(args: LoginArgs, ctx: &Ctx) -> Result<(), CliError> {
    let email = match args.email {
        Some(email) => email,
        None => util::prompt("Email")?,
    };
    let password = util::read_password("Password", args.password_stdin)?;

    let form = ctx.form(LoginInput { email, password });
    let outcome = form
        .post(
            "auth/login",
            SubmitOptions::new().on_before(|d: &LoginInput| {
                !d.email.trim().is_empty() && !d.password.is_empty()
            }),
        )
        .await;

    match util::into_response(outcome)? {
        Some(response) => establish(ctx, &response),
        None => Err(CliError::Validation {
            field: "credentials".into(),
            reason: "email and password are required".into(),
        }),
    }
}

pub async fn register(args: RegisterArgs, ctx: &Ctx) -> Result<(), CliError> {
    let password = util::read_password("Password", args.password_stdin)?;
    let password_confirmation = if args.password_stdin {
        password.clone()
    } else {
        util::read_password("Confirm password", false)?
    };

    let form = ctx.form(RegisterInput {
        name: args.name,
        email: args.email,
        password,
        password_confirmation,
    });

    let checker = form.clone();
    let outcome = form
        .post(
            "auth/register",
            SubmitOptions::new().on_before(move |d: &RegisterInput| {
                if d.password == d.password_confirmation {
                    return true;
                }
                checker.set_error(
                    "password_confirmation",
                    "The password confirmation does not match.",
                );
                false
            }),
        )
        .await;

    match util::into_response(outcome)? {
        Some(response) => establish(ctx, &response),
        None => Err(CliError::rejected(&form.errors())),
    }
}

pub async fn logout(ctx: &Ctx) -> Result<(), CliError> {
    ctx.session.logout().await?;
    output::print_status("Logged out", ctx.quiet);
    Ok(())
}

pub async fn whoami(ctx: &Ctx) -> Result<(), CliError> {
    match ctx.session.fetch_authenticated_user().await {
        SessionStatus::Authenticated => {
            let state = ctx.session.snapshot();
            let Some(user) = state.user else {
                return Err(CliError::NotLoggedIn);
            };
            let out = output::render_single(ctx.output, &user, user_detail, |u| u.email.clone());
            output::print_output(&out, ctx.quiet);
            Ok(())
        }
        SessionStatus::Unauthenticated => Err(CliError::NotLoggedIn),
        SessionStatus::Unreachable => Err(CliError::ConnectionFailed {
            url: ctx.client.base_url().to_string(),
            source: "profile request failed".into(),
        }),
    }
}
