use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Comment, Follow, Like, Post, User};

use super::age::age_since;

/// The public face of a user, nested wherever a user is referenced.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimpleUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentResponse {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub owner: SimpleUserResponse,
    pub age: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LikeResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub owner: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PostResponse {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub comments: Vec<CommentResponse>,
    pub likes: Vec<LikeResponse>,
    pub age: String,
    pub owner: SimpleUserResponse,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct FollowResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub followed: SimpleUserResponse,
    pub following: SimpleUserResponse,
}

/// Full profile: the user plus their posts and both directions of the
/// follow graph. The password hash never leaves the server.
#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub posts: Vec<PostResponse>,
    pub followings: Vec<FollowResponse>,
    pub followers: Vec<FollowResponse>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct DetailResponse {
    pub detail: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResetLinkResponse {
    pub valid: bool,
}

impl From<User> for SimpleUserResponse {
    fn from(
        User {
            id,
            username,
            email,
            bio,
            avatar,
            gender,
            ..
        }: User,
    ) -> Self {
        SimpleUserResponse {
            id,
            username,
            email,
            bio,
            avatar,
            gender,
        }
    }
}

impl CommentResponse {
    pub fn new(
        Comment {
            id,
            message,
            created_at,
            ..
        }: Comment,
        owner: SimpleUserResponse,
        now: DateTime<Utc>,
    ) -> Self {
        CommentResponse {
            id,
            message,
            created_at,
            owner,
            age: age_since(created_at, now),
        }
    }
}

impl From<Like> for LikeResponse {
    fn from(
        Like {
            id,
            created_at,
            owner_id,
            ..
        }: Like,
    ) -> Self {
        LikeResponse {
            id,
            created_at,
            owner: owner_id,
        }
    }
}

impl PostResponse {
    pub fn new(
        Post {
            id,
            message,
            image,
            created_at,
            ..
        }: Post,
        owner: SimpleUserResponse,
        comments: Vec<CommentResponse>,
        likes: Vec<LikeResponse>,
        now: DateTime<Utc>,
    ) -> Self {
        PostResponse {
            id,
            message,
            created_at,
            image,
            comments,
            likes,
            age: age_since(created_at, now),
            owner,
        }
    }
}

impl FollowResponse {
    pub fn new(
        Follow { id, created_at, .. }: Follow,
        followed: SimpleUserResponse,
        following: SimpleUserResponse,
    ) -> Self {
        FollowResponse {
            id,
            created_at,
            followed,
            following,
        }
    }
}

impl UserResponse {
    pub fn new(
        user: User,
        posts: Vec<PostResponse>,
        followings: Vec<FollowResponse>,
        followers: Vec<FollowResponse>,
    ) -> Self {
        let SimpleUserResponse {
            id,
            username,
            email,
            bio,
            avatar,
            gender,
        } = user.into();
        UserResponse {
            id,
            username,
            email,
            bio,
            avatar,
            gender,
            posts,
            followings,
            followers,
        }
    }
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        DetailResponse {
            detail: detail.into(),
        }
    }
}
