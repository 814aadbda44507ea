//! HTTP client for the restaurant REST API
//!
//! Every response body passes through [`shared::envelope`], so callers only
//! ever see plain lists and plain objects.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use shared::envelope::{decode_list, decode_object};
use shared::models::{
    AvailabilityQuery, AvailabilityResponse, CanCloseResponse, Capability, DiningTable,
    DiningTableCreate,
    DiningTableUpdate, Order, OrderStatus, OrderStatusUpdate, Reservation, ReservationCreate,
    ReservationStatus, ReservationUpdate, Role, User, UserCreate, UserRoleUpdate, UserStatus,
    UserStatusUpdate, UserUpdate,
};
use shared::validation::validate_table;
use shared::{OrderId, ReservationId, TableId, UserId};

use crate::{ClientConfig, ClientError, ClientResult, FormResult};

/// Error body returned by the backend
#[derive(serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// The subset of the API the floor view and the reconciler depend on
#[async_trait]
pub trait FloorApi: Send + Sync {
    async fn fetch_tables(&self) -> ClientResult<Vec<DiningTable>>;
    /// Orders that can occupy a table (open, in progress, ready, payment)
    async fn fetch_active_orders(&self) -> ClientResult<Vec<Order>>;
    async fn fetch_reservations(&self) -> ClientResult<Vec<Reservation>>;
    async fn set_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> ClientResult<()>;
    /// Server-authoritative overlap check
    async fn check_availability(&self, query: &AvailabilityQuery) -> ClientResult<bool>;
    async fn create_reservation(&self, draft: &ReservationCreate) -> ClientResult<Reservation>;
    async fn update_reservation(
        &self,
        id: ReservationId,
        update: &ReservationUpdate,
    ) -> ClientResult<()>;
}

/// 网络 HTTP 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    /// Role of the session behind `token`, when known
    role: Option<Role>,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            role: None,
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub(crate) fn clear_token(&mut self) {
        self.token = None;
        self.role = None;
    }

    /// Refuse locally what the session's role may not do. Without a known
    /// role the server decides.
    fn require(&self, capability: Capability) -> ClientResult<()> {
        match self.role {
            Some(role) if !role.allows(capability) => Err(ClientError::Forbidden(format!(
                "{role:?} lacks {capability:?}"
            ))),
            _ => Ok(()),
        }
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Value> {
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await
    }

    /// Map HTTP errors and parse the body. Empty bodies become `null`.
    async fn handle_response(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .ok()
                .and_then(|e| e.message.or(e.error))
                .unwrap_or(text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::FORBIDDEN => ClientError::Forbidden(message),
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                StatusCode::CONFLICT => ClientError::Conflict(message),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ClientError::Validation(message)
                }
                _ => ClientError::Internal(format!("{status}: {message}")),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    // ========== Raw verbs ==========

    pub async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<Value> {
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> ClientResult<Value> {
        self.send(self.client.post(self.url(path))).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    pub async fn put_empty(&self, path: &str) -> ClientResult<Value> {
        self.send(self.client.put(self.url(path))).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.send(self.client.delete(self.url(path))).await
    }

    fn decode<T: DeserializeOwned>(body: Value, what: &str) -> ClientResult<T> {
        decode_object(body).map_err(|e| ClientError::InvalidResponse(format!("{what}: {e}")))
    }

    // ========== Tables API ==========

    pub async fn list_tables(&self) -> ClientResult<Vec<DiningTable>> {
        Ok(decode_list(self.get("tables").await?))
    }

    /// Create a table. `existing` is the current table list, checked for name clashes.
    pub async fn create_table(
        &self,
        table: &DiningTableCreate,
        existing: &[DiningTable],
    ) -> FormResult<DiningTable> {
        self.require(Capability::ManageTables)?;
        validate_table(&table.name, table.capacity, existing, None)?;

        let payload = DiningTableCreate {
            name: table.name.trim().to_string(),
            capacity: table.capacity,
        };
        Ok(Self::decode(self.post("tables", &payload).await?, "created table")?)
    }

    /// Edit `current`. Fields left out of `update` keep their current value.
    pub async fn update_table(
        &self,
        current: &DiningTable,
        update: &DiningTableUpdate,
        existing: &[DiningTable],
    ) -> FormResult<()> {
        self.require(Capability::ManageTables)?;
        let name = update.name.as_deref().unwrap_or(&current.name);
        let capacity = update.capacity.unwrap_or(current.capacity);
        validate_table(name, capacity, existing, Some(current.id))?;

        let payload = DiningTableUpdate {
            name: update.name.as_ref().map(|n| n.trim().to_string()),
            capacity: update.capacity,
        };
        self.put(&format!("tables/{}", current.id), &payload).await?;
        Ok(())
    }

    pub async fn delete_table(&self, id: TableId) -> ClientResult<()> {
        self.require(Capability::ManageTables)?;
        self.delete(&format!("tables/{id}")).await?;
        Ok(())
    }

    // ========== Orders API ==========

    /// `GET /orders`, optionally filtered by one or more statuses
    pub async fn list_orders(&self, statuses: &[OrderStatus]) -> ClientResult<Vec<Order>> {
        let query: Vec<(&str, &str)> = statuses.iter().map(|s| ("status", s.as_str())).collect();
        Ok(decode_list(self.get_with_query("orders", &query).await?))
    }

    /// Move an order along its workflow. The transition is checked locally first.
    pub async fn update_order_status(&self, order: &Order, next: OrderStatus) -> ClientResult<()> {
        self.require(Capability::UpdateOrders)?;
        if !order.status.can_transition_to(next) {
            return Err(ClientError::InvalidTransition(format!(
                "order {} cannot go from {} to {}",
                order.id, order.status, next
            )));
        }
        self.put(
            &format!("orders/{}/status", order.id),
            &OrderStatusUpdate { status: next },
        )
        .await?;
        Ok(())
    }

    pub async fn can_close_order(&self, id: OrderId) -> ClientResult<CanCloseResponse> {
        Self::decode(
            self.get(&format!("orders/{id}/can-close")).await?,
            "can-close",
        )
    }

    pub async fn close_order(&self, id: OrderId) -> ClientResult<()> {
        self.require(Capability::UpdateOrders)?;
        self.put_empty(&format!("orders/{id}/close")).await?;
        Ok(())
    }

    // ========== Reservations API ==========

    pub async fn delete_reservation(&self, id: ReservationId) -> ClientResult<()> {
        self.require(Capability::ManageReservations)?;
        self.delete(&format!("reservations/{id}")).await?;
        Ok(())
    }

    // ========== Users API ==========

    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        Ok(decode_list(self.get("users").await?))
    }

    /// Create a user with `user.role`, which the session must be allowed to assign
    pub async fn create_user(&self, user: &UserCreate) -> ClientResult<User> {
        self.require_assign(user.role)?;
        Self::decode(self.post("users", user).await?, "created user")
    }

    pub async fn update_user(&self, id: UserId, update: &UserUpdate) -> ClientResult<()> {
        self.require(Capability::ManageUsers)?;
        self.put(&format!("users/{id}"), update).await?;
        Ok(())
    }

    pub async fn update_user_role(&self, id: UserId, role: Role) -> ClientResult<()> {
        self.require_assign(role)?;
        self.put(&format!("users/{id}/role"), &UserRoleUpdate { role })
            .await?;
        Ok(())
    }

    pub async fn update_user_status(&self, id: UserId, status: UserStatus) -> ClientResult<()> {
        self.require(Capability::ManageUsers)?;
        self.put(&format!("users/{id}/status"), &UserStatusUpdate { status })
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: UserId) -> ClientResult<()> {
        self.require(Capability::ManageUsers)?;
        self.delete(&format!("users/{id}")).await?;
        Ok(())
    }

    fn require_assign(&self, target: Role) -> ClientResult<()> {
        self.require(Capability::ManageUsers)?;
        match self.role {
            Some(role) if !role.can_assign(target) => Err(ClientError::Forbidden(format!(
                "{role:?} cannot assign {target:?}"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl FloorApi for ApiClient {
    async fn fetch_tables(&self) -> ClientResult<Vec<DiningTable>> {
        self.list_tables().await
    }

    async fn fetch_active_orders(&self) -> ClientResult<Vec<Order>> {
        self.list_orders(&OrderStatus::ACTIVE).await
    }

    async fn fetch_reservations(&self) -> ClientResult<Vec<Reservation>> {
        Ok(decode_list(self.get("reservations").await?))
    }

    async fn set_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> ClientResult<()> {
        self.require(Capability::ManageReservations)?;
        self.update_reservation(id, &ReservationUpdate::status(status))
            .await
    }

    async fn check_availability(&self, query: &AvailabilityQuery) -> ClientResult<bool> {
        let response: AvailabilityResponse = Self::decode(
            self.get_with_query("reservations/available", query).await?,
            "availability",
        )?;
        Ok(response.available)
    }

    async fn create_reservation(&self, draft: &ReservationCreate) -> ClientResult<Reservation> {
        self.require(Capability::ManageReservations)?;
        Self::decode(
            self.post("reservations", draft).await?,
            "created reservation",
        )
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        update: &ReservationUpdate,
    ) -> ClientResult<()> {
        self.require(Capability::ManageReservations)?;
        self.put(&format!("reservations/{id}"), update).await?;
        Ok(())
    }
}
