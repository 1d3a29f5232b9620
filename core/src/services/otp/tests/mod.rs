mod verification_tests;
