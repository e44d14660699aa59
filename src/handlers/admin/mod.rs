pub mod team_admin_handler;
