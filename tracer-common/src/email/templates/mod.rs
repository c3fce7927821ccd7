use std::time::Duration;

pub struct OtpMessage {}
pub struct PasswordChangedMessage {}

impl OtpMessage {
    pub fn generate(otp: &str, otp_lifetime: Duration) -> String {
        format!(
            "<html>
               <head>
                 <style>
                   body {{
                     font-family: Arial, sans-serif;
                     text-align: center;
                   }}
                 </style>
               </head>
             <body>
               <h1>Tracer Study Portal Password Reset Code</h1>
               <h2 style=\"font-family: 'Courier New', monospace; user-select: all; \
               -webkit-user-select: all;\"><b>{}</b></h2>
               <p>Enter this code to reset your password. We will never ask you for \
               this code over the phone or email. <b>Your code expires in {} \
               minutes.</b></p>
               <br />
               <p><i>Didn't request a password reset? You can safely ignore this \
               email.</i></p>
             </body>
             </html>",
            otp,
            otp_lifetime.as_secs() / 60,
        )
    }
}

impl PasswordChangedMessage {
    pub fn generate() -> String {
        String::from(
            "<html>
               <head>
                 <style>
                   body {
                     font-family: Arial, sans-serif;
                     text-align: center;
                   }
                 </style>
               </head>
             <body>
               <h1>Tracer Study Portal Password Changed</h1>
               <p>The password for your Tracer Study Portal account was just changed. \
               If you made this change, no further action is needed.</p>
               <p><b>If you did not change your password, contact your program \
               administrator immediately.</b></p>
             </body>
             </html>",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_message_contains_code_and_lifetime() {
        let message = OtpMessage::generate("481673", Duration::from_secs(600));

        assert!(message.contains("481673"));
        assert!(message.contains("10"));
    }
}
