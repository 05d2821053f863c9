mod client;

pub use client::{
    GraphqlError, GraphqlResponseError, GraphqlResult, LabelNode, LabelParent,
    LinearGraphqlClient, LABEL_PAGE_SIZE,
};
