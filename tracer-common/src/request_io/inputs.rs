use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputEmail {
    pub email: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ZeroizeOnDrop)]
pub struct InputOtp {
    #[zeroize(skip)]
    pub email: String,
    pub otp: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ZeroizeOnDrop)]
pub struct InputNewPassword {
    pub new_password: String,
    pub new_password_confirmation: String,
}
