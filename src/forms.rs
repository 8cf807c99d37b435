//! Acknowledgement-only interactions
//!
//! Likes, comments, replies, newsletter sign-ups and contact messages never
//! reach the content store. Likes live in a per-session [`LikeLedger`];
//! everything else validates its input and answers with a [`Notice`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Liked comments and replies for the current session
#[derive(Debug, Clone, Default)]
pub struct LikeLedger {
    comments: HashSet<String>,
    replies: HashSet<String>,
}

impl LikeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like or unlike a comment; returns whether it is now liked
    pub fn toggle_comment(&mut self, id: &str) -> bool {
        toggle(&mut self.comments, id)
    }

    /// Like or unlike a reply; returns whether it is now liked
    pub fn toggle_reply(&mut self, id: &str) -> bool {
        toggle(&mut self.replies, id)
    }

    pub fn comment_liked(&self, id: &str) -> bool {
        self.comments.contains(id)
    }

    pub fn reply_liked(&self, id: &str) -> bool {
        self.replies.contains(id)
    }

    /// Count shown for a comment with `baseline` likes
    pub fn comment_likes(&self, id: &str, baseline: u32) -> u32 {
        baseline.saturating_add(u32::from(self.comment_liked(id)))
    }

    /// Count shown for a reply with `baseline` likes
    pub fn reply_likes(&self, id: &str, baseline: u32) -> u32 {
        baseline.saturating_add(u32::from(self.reply_liked(id)))
    }
}

fn toggle(set: &mut HashSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}

/// Acknowledgement shown after a form action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    CommentLiked,
    ReplyLiked,
    CommentSubmitted,
    EmptyComment,
    ReplySubmitted,
    EmptyReply,
    Subscribed,
    InvalidEmail,
    MessageSent,
    IncompleteMessage,
}

impl Notice {
    const ALL: [Notice; 10] = [
        Notice::CommentLiked,
        Notice::ReplyLiked,
        Notice::CommentSubmitted,
        Notice::EmptyComment,
        Notice::ReplySubmitted,
        Notice::EmptyReply,
        Notice::Subscribed,
        Notice::InvalidEmail,
        Notice::MessageSent,
        Notice::IncompleteMessage,
    ];

    /// Stable code carried in the `notice` query parameter
    pub fn code(&self) -> &'static str {
        match self {
            Notice::CommentLiked => "comment-liked",
            Notice::ReplyLiked => "reply-liked",
            Notice::CommentSubmitted => "comment-submitted",
            Notice::EmptyComment => "empty-comment",
            Notice::ReplySubmitted => "reply-submitted",
            Notice::EmptyReply => "empty-reply",
            Notice::Subscribed => "subscribed",
            Notice::InvalidEmail => "invalid-email",
            Notice::MessageSent => "message-sent",
            Notice::IncompleteMessage => "incomplete-message",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::CommentLiked => "Comment liked!",
            Notice::ReplyLiked => "Reply liked!",
            Notice::CommentSubmitted => "Comment submitted!",
            Notice::EmptyComment => "Empty comment",
            Notice::ReplySubmitted => "Reply submitted!",
            Notice::EmptyReply => "Empty reply",
            Notice::Subscribed => "Thanks for subscribing!",
            Notice::InvalidEmail => "Invalid email",
            Notice::MessageSent => "Message Sent!",
            Notice::IncompleteMessage => "Incomplete message",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Notice::CommentLiked => "You liked this comment.",
            Notice::ReplyLiked => "You liked this reply.",
            Notice::CommentSubmitted => "Your comment has been posted.",
            Notice::EmptyComment | Notice::EmptyReply => {
                "Please write something before submitting."
            }
            Notice::ReplySubmitted => "Your reply has been posted.",
            Notice::Subscribed => "You've been added to our newsletter.",
            Notice::InvalidEmail => "Please enter a valid email address.",
            Notice::MessageSent => "Thank you for contacting us. We'll respond shortly.",
            Notice::IncompleteMessage => "Please fill in your name, email and message.",
        }
    }

    /// Error-styled notices
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Notice::EmptyComment
                | Notice::EmptyReply
                | Notice::InvalidEmail
                | Notice::IncompleteMessage
        )
    }
}

/// Comment or reply body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub content: String,
}

/// Newsletter sign-up
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Contact page form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Any form carrying only a return path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectForm {
    #[serde(default)]
    pub redirect: Option<String>,
}

fn plausible_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.contains('@')
}

pub fn comment_notice(form: &MessageForm) -> Notice {
    if form.content.trim().is_empty() {
        Notice::EmptyComment
    } else {
        Notice::CommentSubmitted
    }
}

pub fn reply_notice(form: &MessageForm) -> Notice {
    if form.content.trim().is_empty() {
        Notice::EmptyReply
    } else {
        Notice::ReplySubmitted
    }
}

pub fn subscribe_notice(form: &SubscribeForm) -> Notice {
    if plausible_email(&form.email) {
        Notice::Subscribed
    } else {
        Notice::InvalidEmail
    }
}

pub fn contact_notice(form: &ContactForm) -> Notice {
    if form.name.trim().is_empty() || form.message.trim().is_empty() {
        Notice::IncompleteMessage
    } else if !plausible_email(&form.email) {
        Notice::InvalidEmail
    } else {
        Notice::MessageSent
    }
}

/// Local path to return to after a form post, `/` otherwise
pub fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Append `notice=<code>` to a local path, replacing any previous notice
pub fn with_notice(path: &str, notice: Notice) -> String {
    let notice_param = format!("notice={}", notice.code());
    let (base, query) = path.split_once('?').unwrap_or((path, ""));
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("notice="))
        .collect();
    params.push(&notice_param);
    format!("{}?{}", base, params.join("&"))
}
