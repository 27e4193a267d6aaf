use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::me,
        crate::api::users::update_profile,
        crate::api::designs::list_designs,
        crate::api::designs::get_design,
        crate::api::designs::create_design,
        crate::api::payments::create_order,
        crate::api::payments::verify_payment,
        crate::api::purchases::list_my_purchases
    ),
    components(
        schemas(
            crate::api::auth::SignupRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::users::UpdateProfileRequest,
            crate::api::designs::CreateDesignRequest,
            crate::api::payments::CreateOrderBody,
            crate::api::payments::VerifyPaymentBody,
            crate::models::User,
            crate::models::Design,
            crate::models::Purchase
        )
    ),
    tags(
        (name = "auth", description = "Signup, login, sessions"),
        (name = "users", description = "Profile management"),
        (name = "designs", description = "Design catalog"),
        (name = "payments", description = "Gateway orders and payment verification"),
        (name = "purchases", description = "Purchase ledger")
    )
)]
pub struct ApiDoc;
