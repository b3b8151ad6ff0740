//! Account queries and mutations

use async_graphql::{Context, FieldResult, Object, SimpleObject};

use crate::backend::auth::{service as auth_service, Registration, TokenPair};
use crate::backend::error::GraphQLResultExt;

use super::schema::{current_user, GraphQLContext};
use super::types::UserType;

#[derive(SimpleObject)]
pub struct LoginPayload {
    pub token: TokenPair,
    pub user: UserType,
}

#[derive(SimpleObject)]
pub struct RefreshTokenPayload {
    pub access: String,
}

#[derive(SimpleObject)]
pub struct RegisterPayload {
    pub user: UserType,
}

#[derive(SimpleObject)]
pub struct VerifyEmailPayload {
    pub success: bool,
    pub message: String,
    pub token: Option<TokenPair>,
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The authenticated user
    async fn me(&self, ctx: &Context<'_>) -> FieldResult<UserType> {
        Ok(current_user(ctx).await?.into())
    }

    /// Every user (staff only)
    async fn users(&self, ctx: &Context<'_>) -> FieldResult<Vec<UserType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let caller = current_user(ctx).await?;
        let users = auth_service::list_users(&context.pool, &caller).await.graphql()?;
        Ok(users.into_iter().map(UserType::from).collect())
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> FieldResult<LoginPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let result = auth_service::login(&context.pool, &context.sessions, &username, &password)
            .await
            .graphql()?;

        Ok(LoginPayload {
            token: result.token,
            user: result.user.into(),
        })
    }

    /// Exchange a refresh token for a new access token
    async fn refresh_token(
        &self,
        ctx: &Context<'_>,
        refresh_token: String,
    ) -> FieldResult<RefreshTokenPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let access = auth_service::refresh_token(&context.pool, &context.sessions, &refresh_token)
            .await
            .graphql()?;
        Ok(RefreshTokenPayload { access })
    }

    /// Create an inactive account and mail its verification token
    async fn register(
        &self,
        ctx: &Context<'_>,
        user_name: String,
        email: String,
        password: String,
        first_name: String,
        last_name: String,
    ) -> FieldResult<RegisterPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = auth_service::register(
            &context.pool,
            &context.mail,
            context.verification_ttl,
            Registration {
                user_name: &user_name,
                email: &email,
                password: &password,
                first_name: &first_name,
                last_name: &last_name,
            },
        )
        .await
        .graphql()?;

        Ok(RegisterPayload { user: user.into() })
    }

    async fn verify_email(&self, ctx: &Context<'_>, token: String) -> FieldResult<VerifyEmailPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let outcome = auth_service::verify_email(&context.pool, &context.sessions, &token)
            .await
            .graphql()?;

        Ok(VerifyEmailPayload {
            success: outcome.success,
            message: outcome.message.to_string(),
            token: outcome.token,
        })
    }
}
