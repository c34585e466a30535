use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        coupons::CouponList,
        orders::{CreateOrderRequest, OrderList, PayOrderRequest, PaymentReceipt},
        screenings::SeatMap,
    },
    models::{Coupon, CouponStatus, Order, OrderStatus, Screening, User},
    response::{ApiResponse, Meta},
    routes::{auth, coupons, health, orders, screenings},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::cancel_order,
        orders::pay_order,
        coupons::list_coupons,
        screenings::seat_map
    ),
    components(
        schemas(
            User,
            Screening,
            Order,
            OrderStatus,
            Coupon,
            CouponStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateOrderRequest,
            PayOrderRequest,
            PaymentReceipt,
            OrderList,
            CouponList,
            SeatMap,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentReceipt>,
            ApiResponse<CouponList>,
            ApiResponse<SeatMap>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Orders", description = "Seat orders and payment"),
        (name = "Coupons", description = "Reward coupons"),
        (name = "Screenings", description = "Seat availability"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
