// Authentication domain
//
// The login handshake (OAuth, 2FA) is an external collaborator; only token
// issuance and verification live here. Real-time transports pass the token as
// a `?token=` query parameter because EventSource cannot set headers.

pub mod jwt;

pub use jwt::{Claims, JwtService};
