mod otp_error_tests;
