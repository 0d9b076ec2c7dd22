// handlers/mod.rs - Two-tier handler layout
//
// Public (no principal needed) → Protected (principal required, ownership
// checked per resource). The authentication gate runs in front of both tiers;
// it never rejects, so each protected handler asks for `CurrentUser` itself.

pub mod protected; // /api/users, /api/emotions, /api/conversations, /api/chat, /api/notifications, /api/progress
pub mod public; // /, /health, /api/auth/*
