// src/services/auth.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bcrypt::verify;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::within_store_timeout, error::AppError, validation::digits_only},
    db::UserDirectory,
    models::auth::{
        AuthResponse, Claims, LoginUserPayload, PlannerLoginPayload, RegisterUserPayload, RegisteredUser,
        Role, Session, User,
    },
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    jwt_secret: String,
    planner_password_hash: Option<String>,
    session_ttl: TimeDelta,
    timeout: Duration,
    // jti -> expiração original do token
    revoked: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        jwt_secret: String,
        planner_password_hash: Option<String>,
        session_ttl: TimeDelta,
        timeout: Duration,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            planner_password_hash,
            session_ttl,
            timeout,
            revoked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register_user(&self, mut payload: RegisterUserPayload) -> Result<RegisteredUser, AppError> {
        // E-mail em branco conta como ausente
        payload.email = payload.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        payload.validate()?;

        let whatsapp = digits_only(&payload.whatsapp);
        let whatsapp_last4 = whatsapp[whatsapp.len() - 4..].to_string();
        let first_name = payload.first_name.trim().to_string();

        let taken = within_store_timeout(
            self.timeout,
            self.users.conflicts_with(&whatsapp, &first_name, &whatsapp_last4),
        )
        .await?;
        if taken {
            tracing::warn!("Cadastro recusado: WhatsApp ou nome+final já existentes");
            return Err(AppError::DuplicateUser);
        }

        let user = RegisteredUser {
            id: Uuid::new_v4(),
            first_name,
            last_name: payload.last_name.trim().to_string(),
            whatsapp,
            whatsapp_last4,
            email: payload.email,
            registered_at: Utc::now(),
        };

        // O índice único ainda pode recusar em caso de corrida
        within_store_timeout(self.timeout, self.users.insert(&user)).await?;

        tracing::info!("👤 Morador {} cadastrado", user.id);
        Ok(user)
    }

    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let registered = within_store_timeout(
            self.timeout,
            self.users.find_by_login(payload.first_name.trim(), &payload.whatsapp_last4),
        )
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        self.issue(User::client_from(&registered))
    }

    pub async fn login_planner(&self, payload: PlannerLoginPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let Some(password_hash) = self.planner_password_hash.clone() else {
            tracing::warn!("Login de planejador sem PLANNER_PASSWORD_HASH configurado");
            return Err(AppError::InvalidCredentials);
        };

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&payload.password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!("Senha de planejador incorreta");
            return Err(AppError::InvalidCredentials);
        }

        self.issue(User::planner())
    }

    /// Reconstrói a sessão a partir do token. Tokens revogados no logout são recusados.
    pub async fn validate_token(&self, token: &str) -> Result<Session, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        let claims = token_data.claims;

        if self.revoked.read().await.contains_key(&claims.jti) {
            return Err(AppError::InvalidToken);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .ok_or(AppError::InvalidToken)?;

        let session = Session {
            user: User {
                id: claims.sub,
                first_name: claims.first_name,
                full_name: claims.full_name,
                role: claims.role,
                whatsapp_last4: claims.last4,
            },
            token_id: claims.jti,
            expires_at,
        };
        session.ensure_active(Utc::now())?;

        Ok(session)
    }

    pub async fn logout(&self, session: &Session) {
        let now = Utc::now();
        let mut revoked = self.revoked.write().await;
        // Tokens já expirados não precisam mais ficar na lista
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.insert(session.token_id, session.expires_at);

        tracing::info!("🚪 Sessão de {} encerrada", session.user.id);
    }

    fn issue(&self, user: User) -> Result<AuthResponse, AppError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let claims = Claims {
            sub: user.id.clone(),
            first_name: user.first_name.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            last4: user.whatsapp_last4.clone(),
            jti: Uuid::new_v4(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?;

        if user.role == Role::Planner {
            tracing::info!("🔑 Planejador autenticado");
        } else {
            tracing::info!("🔑 Morador {} autenticado", user.id);
        }

        Ok(AuthResponse { token, user, expires_at })
    }
}
