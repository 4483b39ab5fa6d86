#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchReq {
    #[prost(string, tag = "1")]
    pub topic: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub partition: i32,
    #[prost(uint64, tag = "3")]
    pub offset: u64,
    #[prost(uint32, tag = "4")]
    pub max_records: u32,
    /// -1 for consumers.
    #[prost(int32, tag = "5")]
    pub replica_id: i32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchResult {
    #[prost(oneof = "proto_fetch_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_fetch_result::Result>,
}
/// Nested message and enum types in `ProtoFetchResult`.
pub mod proto_fetch_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoFetchSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoFetchError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchSuccess {
    #[prost(message, repeated, tag = "1")]
    pub records: ::prost::alloc::vec::Vec<ProtoRecord>,
    #[prost(uint64, tag = "2")]
    pub high_watermark: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRecord {
    #[prost(uint64, tag = "1")]
    pub offset: u64,
    #[prost(int64, tag = "2")]
    pub timestamp_ms: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchError {
    #[prost(oneof = "proto_fetch_error::Err", tags = "1, 2, 3, 4")]
    pub err: ::core::option::Option<proto_fetch_error::Err>,
}
/// Nested message and enum types in `ProtoFetchError`.
pub mod proto_fetch_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        NotLeader(super::ProtoNotLeader),
        #[prost(message, tag = "2")]
        UnknownPartition(super::ProtoUnknownPartition),
        #[prost(message, tag = "3")]
        OffsetOutOfRange(super::ProtoOffsetOutOfRange),
        #[prost(message, tag = "4")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotLeader {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUnknownPartition {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoOffsetOutOfRange {
    #[prost(uint64, tag = "1")]
    pub log_end_offset: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
// -- Consensus payloads --

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPartition {
    #[prost(string, tag = "1")]
    pub topic: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub id: i32,
    #[prost(int32, tag = "3")]
    pub leader: i32,
    #[prost(int32, repeated, tag = "4")]
    pub replicas: ::prost::alloc::vec::Vec<i32>,
    #[prost(int32, repeated, tag = "5")]
    pub isr: ::prost::alloc::vec::Vec<i32>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRaftCommand {
    #[prost(enumeration = "ProtoCommandKind", tag = "1")]
    pub kind: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoCommandKind {
    Unspecified = 0,
    CreatePartition = 1,
    DeletePartition = 2,
    UpdatePartition = 3,
}
#[doc = r" Generated client implementations."]
pub mod grpc_replication_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Served by every broker. Followers call Fetch on the partition leader."]
    pub struct GrpcReplicationClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcReplicationClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcReplicationClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn fetch(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFetchReq>,
        ) -> Result<tonic::Response<super::ProtoFetchResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/replication.GrpcReplication/Fetch");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcReplicationClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcReplicationClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcReplicationClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_replication_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcReplicationServer."]
    #[async_trait]
    pub trait GrpcReplication: Send + Sync + 'static {
        async fn fetch(
            &self,
            request: tonic::Request<super::ProtoFetchReq>,
        ) -> Result<tonic::Response<super::ProtoFetchResult>, tonic::Status>;
    }
    #[doc = " Served by every broker. Followers call Fetch on the partition leader."]
    #[derive(Debug)]
    pub struct GrpcReplicationServer<T: GrpcReplication> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcReplication> GrpcReplicationServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcReplicationServer<T>
    where
        T: GrpcReplication,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/replication.GrpcReplication/Fetch" => {
                    #[allow(non_camel_case_types)]
                    struct FetchSvc<T: GrpcReplication>(pub Arc<T>);
                    impl<T: GrpcReplication> tonic::server::UnaryService<super::ProtoFetchReq> for FetchSvc<T> {
                        type Response = super::ProtoFetchResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFetchReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).fetch(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = FetchSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcReplication> Clone for GrpcReplicationServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcReplication> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcReplication> tonic::transport::NamedService for GrpcReplicationServer<T> {
        const NAME: &'static str = "replication.GrpcReplication";
    }
}
