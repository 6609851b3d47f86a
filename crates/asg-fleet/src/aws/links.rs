//! AWS console links for created resources

const EC2_CONSOLE: &str = "https://console.aws.amazon.com/ec2/v2/home";
const AUTOSCALING_CONSOLE: &str = "https://console.aws.amazon.com/ec2autoscaling/home";

pub fn image(region: &str, image_id: &str) -> String {
    format!("{EC2_CONSOLE}?region={region}#ImageDetails:imageId={image_id}")
}

pub fn launch_template(region: &str, launch_template_id: &str) -> String {
    format!("{EC2_CONSOLE}?region={region}#LaunchTemplateDetails:launchTemplateId={launch_template_id}")
}

pub fn target_group(region: &str, target_group_arn: &str) -> String {
    format!("{EC2_CONSOLE}?region={region}#TargetGroup:targetGroupArn={target_group_arn}")
}

/// The console has no stable ARN deep link for balancers, so search by name.
pub fn load_balancer(region: &str, load_balancer_name: &str) -> String {
    format!("{EC2_CONSOLE}?region={region}#LoadBalancers:search={load_balancer_name}")
}

pub fn auto_scaling_group(region: &str, group_name: &str) -> String {
    format!("{AUTOSCALING_CONSOLE}?region={region}#/details/{group_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_embed_region_and_id() {
        assert_eq!(
            image("us-east-2", "ami-1"),
            "https://console.aws.amazon.com/ec2/v2/home?region=us-east-2#ImageDetails:imageId=ami-1"
        );
        assert!(launch_template("eu-west-1", "lt-1").ends_with("?region=eu-west-1#LaunchTemplateDetails:launchTemplateId=lt-1"));
        assert!(target_group("us-east-2", "arn:tg").ends_with("#TargetGroup:targetGroupArn=arn:tg"));
        assert!(load_balancer("us-east-2", "fleet-a").ends_with("#LoadBalancers:search=fleet-a"));
        assert_eq!(
            auto_scaling_group("us-east-2", "fleet_a"),
            "https://console.aws.amazon.com/ec2autoscaling/home?region=us-east-2#/details/fleet_a"
        );
    }
}
