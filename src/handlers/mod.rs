// handlers/mod.rs - route handlers grouped by security tier
//
// Public (no auth): /health, /companies, /auth/login
// Protected (JWT auth): /api/*
pub mod auth;
pub mod companies;
pub mod employees;
pub mod health;
