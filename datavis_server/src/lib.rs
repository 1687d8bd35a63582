// Stand-in for the flight-side datavis thread: simulate, then serve one
// packet per connection.
pub mod config;
pub mod server;
pub mod sim;
