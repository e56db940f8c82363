/// 计算实例的命名空间前缀
///
/// `store_name` 与默认 store name 相同时返回 `"<name>/"`，否则返回 `"<name>/<store_name>/"`。
/// 纯函数，`drop_instance` 依赖它在没有活动实例的情况下重新算出命名空间。
pub fn compute_prefix(name: &str, store_name: &str, default_store_name: &str) -> String {
    if store_name == default_store_name {
        format!("{}/", name)
    } else {
        format!("{}/{}/", name, store_name)
    }
}

/// 某个应用下所有命名空间共同的前缀
pub fn app_prefix(name: &str) -> String {
    format!("{}/", name)
}
