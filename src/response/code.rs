//! Result codes carried by every response envelope.

use std::fmt;

/// A numeric result code paired with its default message.
///
/// Each code maps to exactly one default message. Callers can override the
/// message per response (see [`crate::response::Envelope::error`]) but never
/// the mapping itself.
///
/// Services define their own codes next to the built-in ones:
///
/// ```rust
/// use rest_boot::response::RestCode;
///
/// const ORDER_ALREADY_PAID: RestCode = RestCode::new(20001, "订单已支付");
/// assert_eq!(ORDER_ALREADY_PAID.value(), 20001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RestCode {
    value: u32,
    message: &'static str,
}

impl RestCode {
    pub const SUCCESS: RestCode = RestCode::new(0, "成功");
    pub const FAIL: RestCode = RestCode::new(1, "失败");
    pub const EXCEPTION: RestCode = RestCode::new(2, "系统异常");

    pub const NOT_LOGIN: RestCode = RestCode::new(401, "用户未登录");
    pub const NOT_AUTH: RestCode = RestCode::new(403, "没有访问权限");
    pub const NOT_FOUND: RestCode = RestCode::new(404, "请求的地址不存在");

    pub const DATA_VALIDATE_FAIL: RestCode = RestCode::new(1001, "数据验证失败");
    pub const DATA_JSON_FAIL: RestCode = RestCode::new(1002, "数据解析失败");

    pub const OBJ_NOT_EXIST: RestCode = RestCode::new(2001, "对象不存在");
    pub const OBJ_CREATE_FAIL: RestCode = RestCode::new(2002, "创建失败");
    pub const OBJ_UPDATE_FAIL: RestCode = RestCode::new(2003, "更新失败");
    pub const OBJ_DELETE_FAIL: RestCode = RestCode::new(2004, "删除失败");
    pub const OBJ_ERASE_FAIL: RestCode = RestCode::new(2005, "强制删除失败");
    pub const OBJ_RESTORE_FAIL: RestCode = RestCode::new(2006, "恢复失败");

    pub const REMOTE_FAIL: RestCode = RestCode::new(3001, "远程调用失败");

    const BUILTIN: [RestCode; 15] = [
        Self::SUCCESS,
        Self::FAIL,
        Self::EXCEPTION,
        Self::NOT_LOGIN,
        Self::NOT_AUTH,
        Self::NOT_FOUND,
        Self::DATA_VALIDATE_FAIL,
        Self::DATA_JSON_FAIL,
        Self::OBJ_NOT_EXIST,
        Self::OBJ_CREATE_FAIL,
        Self::OBJ_UPDATE_FAIL,
        Self::OBJ_DELETE_FAIL,
        Self::OBJ_ERASE_FAIL,
        Self::OBJ_RESTORE_FAIL,
        Self::REMOTE_FAIL,
    ];

    /// Creates a code with its default message.
    pub const fn new(value: u32, message: &'static str) -> Self {
        Self { value, message }
    }

    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Default message for this code.
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Resolves a built-in code from its numeric value.
    pub fn lookup(value: u32) -> Option<RestCode> {
        Self::BUILTIN.iter().copied().find(|c| c.value == value)
    }

    /// Returns true for [`RestCode::SUCCESS`].
    pub fn is_success(&self) -> bool {
        self.value == Self::SUCCESS.value
    }
}

impl fmt::Display for RestCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.value)
    }
}

impl From<RestCode> for u32 {
    fn from(code: RestCode) -> Self {
        code.value
    }
}
