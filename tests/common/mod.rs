pub mod cms_server;
