//! Messages and service stubs for `auth.v1.API`, generated from
//! `proto/auth/v1/auth.proto`.

tonic::include_proto!("auth.v1");
