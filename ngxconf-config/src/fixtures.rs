//! Shared test inputs

/// A realistic main configuration touching every grammar rule
pub const COMPLEX: &str = r#"# For more information on configuration, see:
#   * Official English Documentation: http://nginx.org/en/docs/

user  nginx;
worker_processes  auto;
error_log  /var/log/nginx/error.log warn;
pid        /run/nginx.pid;
load_module modules/ngx_http_geoip_module.so;

events {
    worker_connections  1024;
}

http {
    include       /etc/nginx/mime.types;
    default_type  application/octet-stream;

    log_format  main  '$remote_addr - $remote_user [$time_local] "$request" '
                      '$status $body_bytes_sent "$http_referer" '
                      '"$http_user_agent" "$http_x_forwarded_for"';

    access_log  /var/log/nginx/access.log  main;

    sendfile            on;
    tcp_nopush          on;
    keepalive_timeout   65;
    types_hash_max_size 2048;

    map $http_upgrade $connection_upgrade {
        default upgrade;
        ''      close;
        # websocket clients
        ~*^x-ws{1,2}$ upgrade;
    }

    upstream backend {
        server 127.0.0.1:8080 weight=5;
        server unix:/tmp/backend.sock;
    }

    server {
        listen       80 default_server;
        listen       [::]:80 default_server;
        server_name  _;
        root         /usr/share/nginx/html;

        location / {
            root   /usr/share/nginx/html;
            index  index.html index.htm;
        }

        location ~* \.(gif|jpg|png)$ {
            expires 30d;
            add_header Cache-Control "public; max-age=2592000";
        }

        location = /50x.html {
        }

        location ^~/api/ {
            proxy_pass http://backend;
            proxy_set_header Host $host;
            if ($request_method = POST) {
                return 405;
            }
            if ($http_user_agent ~ "(MSIE) (6)") {
                rewrite ^(.*)$ /msie/$1 break;
                break;
            }
        }

        error_page 404 /404.html;
    }
}
"#;
