use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), AppError>;
}

/// Picks the Resend client when an API key is configured.
pub fn from_config(config: &Config) -> Arc<dyn Mailer> {
    match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key.clone(), config.resend_from_email.clone())),
        None => {
            tracing::warn!("RESEND_API_KEY not set, e-mails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self { client: reqwest::Client::new(), api_key, from }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, mail: Mail) -> Result<(), AppError> {
        let body = ResendRequest {
            from: &self.from,
            to: [&mail.to],
            subject: &mail.subject,
            html: &mail.html,
        };
        let resp = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!("resend answered {status}: {detail}")));
        }
        tracing::info!(to = %mail.to, subject = %mail.subject, "e-mail sent");
        Ok(())
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), AppError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.html, "e-mail (not delivered)");
        Ok(())
    }
}

/// Sends in the background; failures are only logged.
pub fn send_detached(mailer: Arc<dyn Mailer>, mail: Mail) {
    tokio::spawn(async move {
        let to = mail.to.clone();
        if let Err(e) = mailer.send(mail).await {
            tracing::error!(%to, error = %e, "background e-mail failed");
        }
    });
}

fn layout(name: &str, intro: &str, url: &str) -> String {
    let name = tera::escape_html(name);
    let url = tera::escape_html(url);
    format!(
        "<p>Olá {name},</p>\
         <p>Bem vindo ao ConectaCondo!</p>\
         <p>{intro}</p>\
         <p><a href=\"{url}\" style=\"background:#000;color:#fff;padding:12px 20px\">Redirecionar</a></p>"
    )
}

pub fn signup_invitation(to: &str, name: &str, url: &str) -> Mail {
    Mail {
        to: to.to_owned(),
        subject: "Bem vindo a ConectaCondo.".to_owned(),
        html: layout(
            name,
            "Este é um e-mail automático convidando você para criar uma conta na nossa aplicação.",
            url,
        ),
    }
}

pub fn password_recovery(to: &str, name: &str, url: &str) -> Mail {
    Mail {
        to: to.to_owned(),
        subject: "Recuperação de senha - ConectaCondo".to_owned(),
        html: layout(name, "Este é um e-mail automático de recuperação de senha.", url),
    }
}

pub fn email_confirmation(to: &str, name: &str, url: &str) -> Mail {
    Mail {
        to: to.to_owned(),
        subject: "Confirme seu e-mail - ConectaCondo".to_owned(),
        html: layout(name, "Confirme seu endereço de e-mail para concluir o cadastro.", url),
    }
}
