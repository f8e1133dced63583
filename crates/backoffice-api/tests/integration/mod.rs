mod http_api;
mod role_assignment;
mod scoped_handlers;
