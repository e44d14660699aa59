pub mod invitation_handler;
pub mod join_request_handler;
pub mod team_handler;
pub mod team_member_handler;
